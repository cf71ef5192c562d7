//! Poll list and vote submission for users

use super::{force_logout_on_unauthorized, InFlight, Phase};
use crate::context::ClientContext;
use crate::error::{ErrorKind, FlowError};
use crate::gating::{can_vote, is_authenticated};
use ballotbox_types::Poll;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub const VOTE_RECORDED_NOTICE: &str = "Vote recorded successfully!";
pub const ONLY_USERS_CAN_VOTE: &str = "Only users can vote.";
pub const LOGIN_REQUIRED: &str = "Please log in to see polls.";

/// What the voting page displays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VotingView {
    pub phase: Phase,
    /// Last list the server returned
    pub polls: Vec<Poll>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

pub struct VotingFlow {
    ctx: ClientContext,
    view: Mutex<VotingView>,
    in_flight: InFlight,
}

impl VotingFlow {
    pub fn new(ctx: ClientContext) -> Self {
        Self {
            ctx,
            view: Mutex::new(VotingView::default()),
            in_flight: InFlight::default(),
        }
    }

    pub fn view(&self) -> VotingView {
        self.view.lock().clone()
    }

    /// Whether the vote buttons should be enabled
    pub fn voting_enabled(&self) -> bool {
        can_vote(&self.ctx.session.get())
    }

    /// Fetch the poll list (any logged-in session)
    pub async fn load(&self) -> Result<(), FlowError> {
        let _guard = self.in_flight.begin()?;

        if !is_authenticated(&self.ctx.session.get()) {
            self.view.lock().error = Some(LOGIN_REQUIRED.to_string());
            return Err(FlowError::Forbidden {
                action: "list polls",
            });
        }

        {
            let mut view = self.view.lock();
            view.phase = Phase::Loading;
            view.error = None;
            view.notice = None;
        }

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

    /// Cast a vote. Tallies are never bumped locally.
    ///
    /// With `refresh_after_vote` set, a successful vote is followed by a
    /// refetch; if that refetch fails the previous list stays and the vote
    /// still counts as recorded. A 404 always triggers a refetch so polls
    /// deleted elsewhere drop out of the list.
    pub async fn vote(&self, poll_id: &str, option_id: &str) -> Result<(), FlowError> {
        let _guard = self.in_flight.begin()?;

        if !can_vote(&self.ctx.session.get()) {
            debug!(poll_id, "Vote blocked: session cannot vote");
            let mut view = self.view.lock();
            view.error = Some(ONLY_USERS_CAN_VOTE.to_string());
            view.notice = None;
            return Err(FlowError::Forbidden { action: "vote" });
        }

        let resume = {
            let mut view = self.view.lock();
            let resume = view.phase.settled();
            view.phase = Phase::Submitting;
            view.error = None;
            view.notice = None;
            resume
        };

        if let Err(e) = self.ctx.api.vote(poll_id, option_id).await {
            warn!(poll_id, option_id, status = e.status, message = %e.message, "Error voting");
            force_logout_on_unauthorized(&self.ctx.session, &e);

            // 404: the poll or option is gone server-side, reconcile with a refetch
            let reconciled = if e.kind() == ErrorKind::NotFound {
                self.refetch().await
            } else {
                None
            };

            let mut view = self.view.lock();
            if let Some(polls) = reconciled {
                view.polls = polls;
            }
            view.phase = Phase::SubmitError;
            view.error = Some(e.user_message().to_string());
            return Err(e.into());
        }

        info!(poll_id, option_id, "Vote recorded");

        let refreshed = if self.ctx.config.refresh_after_vote {
            self.refetch().await
        } else {
            None
        };

        let mut view = self.view.lock();
        if let Some(polls) = refreshed {
            view.polls = polls;
            view.phase = Phase::Loaded;
        } else {
            view.phase = resume;
        }
        view.notice = Some(VOTE_RECORDED_NOTICE.to_string());
        Ok(())
    }

    /// Fresh list, or `None` (logged) if it could not be fetched
    async fn refetch(&self) -> Option<Vec<Poll>> {
        match self.ctx.api.list_polls().await {
            Ok(polls) => Some(polls),
            Err(e) => {
                warn!(status = e.status, message = %e.message, "Refetch after vote failed");
                force_logout_on_unauthorized(&self.ctx.session, &e);
                None
            }
        }
    }
}
