//! Poll management for administrators

use super::{force_logout_on_unauthorized, InFlight, Phase};
use crate::context::ClientContext;
use crate::error::{ErrorKind, FlowError};
use crate::gating::can_administer;
use ballotbox_types::{DraftPoll, Poll};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub const ADMIN_ONLY: &str = "Only administrators can manage polls.";

/// What the admin dashboard displays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminView {
    pub phase: Phase,
    pub polls: Vec<Poll>,
    pub draft: DraftPoll,
    /// Sticky until the next load/create/delete
    pub error: Option<String>,
    pub notice: Option<String>,
}

pub struct AdminFlow {
    ctx: ClientContext,
    view: Mutex<AdminView>,
    in_flight: InFlight,
}

impl AdminFlow {
    pub fn new(ctx: ClientContext) -> Self {
        Self {
            ctx,
            view: Mutex::new(AdminView::default()),
            in_flight: InFlight::default(),
        }
    }

    pub fn view(&self) -> AdminView {
        self.view.lock().clone()
    }

    /// Whether create/delete controls should be enabled
    pub fn controls_enabled(&self) -> bool {
        can_administer(&self.ctx.session.get())
    }

    // ===================
    // Draft editing (local only)
    // ===================

    pub fn set_question(&self, question: impl Into<String>) {
        self.view.lock().draft.set_question(question);
    }

    pub fn add_option(&self) {
        self.view.lock().draft.add_option();
    }

    /// Returns false if `index` is out of range
    pub fn set_option(&self, index: usize, label: impl Into<String>) -> bool {
        self.view.lock().draft.set_option(index, label)
    }

    // ===================
    // Server actions
    // ===================

    /// Fetch the poll list
    pub async fn load(&self) -> Result<(), FlowError> {
        let _guard = self.in_flight.begin()?;
        self.ensure_admin("list polls")?;
        self.start(Phase::Loading);

        match self.ctx.api.list_polls().await {
            Ok(polls) => {
                debug!(count = polls.len(), "Polls loaded");
                let mut view = self.view.lock();
                view.polls = polls;
                view.phase = Phase::Loaded;
                Ok(())
            }
            Err(e) => {
                warn!(status = e.status, message = %e.message, "Error fetching polls");
                force_logout_on_unauthorized(&self.ctx.session, &e);
                let mut view = self.view.lock();
                view.phase = Phase::LoadError;
                view.error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    /// Submit the draft. On success the returned poll is appended once and
    /// the draft resets unless it was edited in the meantime; on failure the
    /// server message is shown verbatim.
    pub async fn create_poll(&self) -> Result<Poll, FlowError> {
        let _guard = self.in_flight.begin()?;
        self.ensure_admin("create poll")?;
        let (draft, resume) = {
            let view = self.view.lock();
            (view.draft.clone(), view.phase.settled())
        };
        self.start(Phase::Submitting);

        debug!(question = %draft.question, options = draft.options.len(), "Creating poll");
        match self
            .ctx
            .api
            .create_poll(&draft.question, &draft.options)
            .await
        {
            Ok(poll) => {
                info!(poll_id = %poll.id, "Poll created");
                let mut view = self.view.lock();
                match view.polls.iter().position(|p| p.id == poll.id) {
                    Some(i) => view.polls[i] = poll.clone(),
                    None => view.polls.push(poll.clone()),
                }
                // Edits made while the request was in flight belong to the next poll
                if view.draft == draft {
                    view.draft.reset();
                }
                view.phase = resume;
                view.notice = Some(format!("Poll \"{}\" created", poll.question));
                Ok(poll)
            }
            Err(e) => {
                warn!(status = e.status, message = %e.message, "Error creating poll");
                force_logout_on_unauthorized(&self.ctx.session, &e);
                let mut view = self.view.lock();
                view.phase = Phase::SubmitError;
                view.error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    /// Delete a poll. The local entry goes only after the server confirms,
    /// or reports it already gone (404).
    pub async fn delete_poll(&self, poll_id: &str) -> Result<(), FlowError> {
        let _guard = self.in_flight.begin()?;
        self.ensure_admin("delete poll")?;
        let resume = self.view.lock().phase.settled();
        self.start(Phase::Submitting);

        debug!(poll_id, "Deleting poll");
        let result = self.ctx.api.delete_poll(poll_id).await;

        let mut view = self.view.lock();
        match result {
            Ok(()) => {
                info!(poll_id, "Poll deleted");
                view.polls.retain(|p| p.id != poll_id);
                view.phase = resume;
                view.notice = Some("Poll deleted".to_string());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(poll_id, "Poll already gone, dropping local entry");
                view.polls.retain(|p| p.id != poll_id);
                view.phase = resume;
                view.notice = Some("Poll was already deleted".to_string());
                Ok(())
            }
            Err(e) => {
                warn!(poll_id, status = e.status, message = %e.message, "Error deleting poll");
                force_logout_on_unauthorized(&self.ctx.session, &e);
                view.phase = Phase::SubmitError;
                view.error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    fn ensure_admin(&self, action: &'static str) -> Result<(), FlowError> {
        if can_administer(&self.ctx.session.get()) {
            return Ok(());
        }
        debug!(action, "Admin action blocked: session is not an administrator");
        let mut view = self.view.lock();
        view.error = Some(ADMIN_ONLY.to_string());
        view.notice = None;
        Err(FlowError::Forbidden { action })
    }

    /// Clears the sticky error: a new action has begun
    fn start(&self, phase: Phase) {
        let mut view = self.view.lock();
        view.phase = phase;
        view.error = None;
        view.notice = None;
    }
}
