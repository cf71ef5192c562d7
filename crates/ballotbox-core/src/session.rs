//! Session store
//!
//! Single owner of the current `Session`. Every change is written to the
//! persistent mirror and pushed synchronously to registered listeners (the
//! API client's bearer header), so no later request can observe a stale token.

use crate::error::CoreError;
use crate::storage::SessionStorage;
use ballotbox_types::{Role, Session};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};

/// Notified after every `set`/`clear`, before the call returns
pub trait SessionListener: Send + Sync {
    fn session_changed(&self, session: &Session);
}

/// In-memory session backed by a `SessionStorage`
pub struct SessionStore {
    current: RwLock<Session>,
    storage: Box<dyn SessionStorage>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
    /// Serializes set/clear so storage, memory and listeners agree on order
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Rehydrate from storage. A record that cannot be read degrades to an
    /// empty session.
    pub fn open(storage: impl SessionStorage + 'static) -> Self {
        let current = match storage.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted session, starting logged out");
                Session::default()
            }
        };

        Self {
            current: RwLock::new(current),
            storage: Box::new(storage),
            listeners: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Current session (cloned snapshot)
    pub fn get(&self) -> Session {
        self.current.read().clone()
    }

    /// Register a listener and immediately replay the current session to it
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) {
        let snapshot = self.get();
        listener.session_changed(&snapshot);
        self.listeners.write().push(listener);
    }

    /// Replace token and role together.
    ///
    /// The record is persisted first; if that fails nothing changes.
    pub fn set(&self, token: impl Into<String>, role: Option<Role>) -> Result<(), CoreError> {
        let session = Session::new(token, role);
        let _guard = self.write_lock.lock();
        self.storage.save(&session)?;

        *self.current.write() = session.clone();
        info!(role = ?session.role, "Session established");
        self.notify(&session);
        Ok(())
    }

    /// Drop token and role together.
    ///
    /// The in-memory session and listeners are always cleared; a failure to
    /// remove the persisted record is returned afterwards.
    pub fn clear(&self) -> Result<(), CoreError> {
        let empty = Session::default();
        let _guard = self.write_lock.lock();
        *self.current.write() = empty.clone();
        info!("Session cleared");
        self.notify(&empty);

        self.storage.clear().inspect_err(|e| {
            warn!(error = %e, "Failed to remove persisted session");
        })
    }

    fn notify(&self, session: &Session) {
        // Snapshot so a listener may subscribe/read without deadlocking
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener.session_changed(session);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.current.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &session.is_authenticated())
            .field("role", &session.role)
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
