//! Poll model as served by the voting API

use serde::{Deserialize, Serialize};

/// A poll owned by the remote API
///
/// The client never edits a poll in place; cached copies are replaced
/// wholesale with whatever the server returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    #[serde(rename = "_id")]
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<PollOption>,
}

/// One selectable answer of a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Server-side tally, never incremented locally
    #[serde(default)]
    pub votes: u64,
}

impl Poll {
    /// Look up an option by id
    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Sum of all option tallies
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }

    /// Option with the highest tally (first one wins ties)
    pub fn leader(&self) -> Option<&PollOption> {
        self.options
            .iter()
            .fold(None, |best: Option<&PollOption>, o| match best {
                Some(b) if b.votes >= o.votes => Some(b),
                _ => Some(o),
            })
            .filter(|o| o.votes > 0)
    }
}

/// Request body for `POST /polls`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<NewPollOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPollOption {
    pub name: String,
}

impl NewPoll {
    pub fn new(question: impl Into<String>, options: &[String]) -> Self {
        Self {
            question: question.into(),
            options: options
                .iter()
                .map(|name| NewPollOption { name: name.clone() })
                .collect(),
        }
    }
}
