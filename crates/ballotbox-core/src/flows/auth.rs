//! Login, registration and logout

use super::InFlight;
use crate::context::ClientContext;
use crate::error::{ApiError, FlowError};
use ballotbox_types::{Role, Session};
use parking_lot::Mutex;
use tracing::{info, warn};

pub const REGISTERED_NOTICE: &str = "Registration successful!";

/// What the login/register forms display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthView {
    pub submitting: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

pub struct AuthFlow {
    ctx: ClientContext,
    view: Mutex<AuthView>,
    in_flight: InFlight,
}

impl AuthFlow {
    pub fn new(ctx: ClientContext) -> Self {
        Self {
            ctx,
            view: Mutex::new(AuthView::default()),
            in_flight: InFlight::default(),
        }
    }

    pub fn view(&self) -> AuthView {
        self.view.lock().clone()
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), FlowError> {
        let _guard = self.in_flight.begin()?;
        self.start();

        let result = self.ctx.api.register(username, password, role).await;
        let mut view = self.view.lock();
        view.submitting = false;
        match result {
            Ok(()) => {
                info!(username, %role, "Registered");
                view.notice = Some(REGISTERED_NOTICE.to_string());
                Ok(())
            }
            Err(e) => {
                warn!(username, status = e.status, message = %e.message, "Registration failed");
                view.error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the session store (and through it the API header) holds
    /// the returned token and role. A 401 here means bad credentials and
    /// leaves any existing session alone, as does a response without a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, FlowError> {
        let _guard = self.in_flight.begin()?;
        self.start();

        let result = self.ctx.api.login(username, password).await;
        let outcome = match result {
            Ok(resp) if resp.token.is_empty() => {
                Err(FlowError::Api(ApiError::invalid_response(
                    200,
                    "login returned an empty token",
                )))
            }
            Ok(resp) => {
                if resp.role.is_none() {
                    warn!(username, "Login returned no recognised role");
                }
                self.ctx
                    .session
                    .set(resp.token, resp.role)
                    .map(|()| self.ctx.session.get())
                    .map_err(FlowError::from)
            }
            Err(e) => Err(e.into()),
        };

        let mut view = self.view.lock();
        view.submitting = false;
        match &outcome {
            Ok(session) => info!(username, role = ?session.role, "Logged in"),
            Err(e) => {
                warn!(username, error = %e, "Login failed");
                view.error = Some(match e {
                    FlowError::Api(api) => api.user_message().to_string(),
                    other => other.to_string(),
                });
            }
        }
        outcome
    }

    /// Drop the session
    pub fn logout(&self) -> Result<(), FlowError> {
        *self.view.lock() = AuthView::default();
        self.ctx.session.clear()?;
        info!("Logged out");
        Ok(())
    }

    fn start(&self) {
        let mut view = self.view.lock();
        view.submitting = true;
        view.error = None;
        view.notice = None;
    }
}
