//! Process-wide wiring: one session store, one API client, listener attached

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::flows::{AdminFlow, AuthFlow, VotingFlow};
use crate::session::SessionStore;
use crate::storage::{FileStorage, SessionStorage};
use std::sync::Arc;
use tracing::debug;

/// Shared handles passed to every flow
///
/// Constructing the context subscribes the API client to the session store,
/// so the bearer header reflects the rehydrated session before any request.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub config: Arc<ClientConfig>,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
}

impl ClientContext {
    pub fn new(
        config: ClientConfig,
        storage: impl SessionStorage + 'static,
    ) -> Result<Self, CoreError> {
        let api = Arc::new(ApiClient::new(&config)?);
        let session = Arc::new(SessionStore::open(storage));
        session.subscribe(api.clone());

        debug!(
            base_url = %config.base_url,
            authenticated = session.get().is_authenticated(),
            "Client context ready"
        );

        Ok(Self {
            config: Arc::new(config),
            session,
            api,
        })
    }

    /// Context persisting the session under `config.state_dir`
    pub fn open(config: ClientConfig) -> Result<Self, CoreError> {
        let storage = FileStorage::in_dir(&config.state_dir);
        Self::new(config, storage)
    }

    pub fn auth_flow(&self) -> AuthFlow {
        AuthFlow::new(self.clone())
    }

    pub fn voting_flow(&self) -> VotingFlow {
        VotingFlow::new(self.clone())
    }

    pub fn admin_flow(&self) -> AdminFlow {
        AdminFlow::new(self.clone())
    }
}
