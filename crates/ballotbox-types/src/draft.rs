//! Draft poll being composed by an administrator

use serde::{Deserialize, Serialize};

/// Unsaved poll: a question plus option labels
///
/// Options only grow while composing; the draft starts (and resets) with a
/// single empty label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPoll {
    pub question: String,
    pub options: Vec<String>,
}

impl Default for DraftPoll {
    fn default() -> Self {
        Self {
            question: String::new(),
            options: vec![String::new()],
        }
    }
}

impl DraftPoll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    /// Append one empty option label
    pub fn add_option(&mut self) {
        self.options.push(String::new());
    }

    /// Edit the label at `index`. Returns false if out of range.
    pub fn set_option(&mut self, index: usize, label: impl Into<String>) -> bool {
        match self.options.get_mut(index) {
            Some(slot) => {
                *slot = label.into();
                true
            }
            None => false,
        }
    }

    /// Back to one empty option and no question
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_blank(&self) -> bool {
        self.question.trim().is_empty() && self.options.iter().all(|o| o.trim().is_empty())
    }
}
