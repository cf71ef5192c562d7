//! Auth, voting and admin flows
//!
//! Each flow owns its view state and allows one request in flight at a time.
//! Failures are logged, recorded in the view and returned; they never leave
//! the view without its last known-good poll list.

pub mod admin;
pub mod auth;
pub mod voting;

pub use admin::{AdminFlow, AdminView};
pub use auth::{AuthFlow, AuthView};
pub use voting::{VotingFlow, VotingView};

use crate::error::{ApiError, FlowError};
use crate::session::SessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Lifecycle of a poll-list view
///
/// `Idle -> Loading -> {Loaded, LoadError}`, then
/// `Loaded -> Submitting -> {Loaded, SubmitError}` for vote/create/delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadError,
    Submitting,
    SubmitError,
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Loading | Phase::Submitting)
    }

    /// Phase to return to once a submission settles successfully
    pub(crate) fn settled(self) -> Phase {
        match self {
            Phase::Idle | Phase::LoadError => self,
            _ => Phase::Loaded,
        }
    }
}

/// One-request-at-a-time latch
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

impl InFlight {
    /// Claim the latch or fail with `Busy`; released when the guard drops
    pub(crate) fn begin(&self) -> Result<InFlightGuard<'_>, FlowError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightGuard(&self.0))
            .map_err(|_| FlowError::Busy)
    }
}

pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A 401 from a poll endpoint means the session is no longer valid
pub(crate) fn force_logout_on_unauthorized(session: &SessionStore, err: &ApiError) {
    if !err.is_unauthorized() {
        return;
    }
    warn!("API rejected the session token, logging out");
    if let Err(e) = session.clear() {
        warn!(error = %e, "Forced logout could not remove persisted session");
    }
}
