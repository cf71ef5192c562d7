//! Persistent mirror of the session
//!
//! Stores `{ "token": ..., "role": ... }` in `<state_dir>/session.json` so a
//! restart reconstructs the same session.

use crate::error::CoreError;
use ballotbox_types::{Role, Session};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the persisted session inside the state directory
pub const SESSION_FILE_NAME: &str = "session.json";

/// Backend for the session store's persistent mirror
pub trait SessionStorage: Send + Sync {
    /// Read the persisted session. A missing record is an empty session.
    fn load(&self) -> Result<Session, CoreError>;

    /// Overwrite the persisted session
    fn save(&self, session: &Session) -> Result<(), CoreError>;

    /// Remove the persisted session
    fn clear(&self) -> Result<(), CoreError>;
}

impl<S: SessionStorage + ?Sized> SessionStorage for Arc<S> {
    fn load(&self) -> Result<Session, CoreError> {
        (**self).load()
    }

    fn save(&self, session: &Session) -> Result<(), CoreError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), CoreError> {
        (**self).clear()
    }
}

/// On-disk record. Role is kept as a plain string so unknown values survive
/// a round trip and are simply ignored on load.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    fn into_session(self) -> Session {
        let token = self.token.filter(|t| !t.is_empty());
        let role = token
            .as_ref()
            .and(self.role.as_deref())
            .and_then(Role::parse);
        Session { token, role }
    }
}

/// JSON file in the state directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `<state_dir>/session.json`
    pub fn in_dir(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(SESSION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Session, CoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(source) => {
                return Err(CoreError::FileRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let record: SessionRecord =
            serde_json::from_str(&content).map_err(|source| CoreError::JsonParse {
                path: self.path.clone(),
                message: source.to_string(),
                source,
            })?;

        Ok(record.into_session())
    }

    fn save(&self, session: &Session) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let record = SessionRecord {
            token: session.token.clone(),
            role: session.role.map(|r| r.as_str().to_string()),
            saved_at: Some(Utc::now()),
        };
        let content = serde_json::to_string_pretty(&record).map_err(|source| {
            CoreError::JsonParse {
                path: self.path.clone(),
                message: source.to_string(),
                source,
            }
        })?;

        // Write to a sibling file first so a crash never leaves half a record
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|source| CoreError::FileWrite {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| CoreError::FileWrite {
            path: self.path.clone(),
            source,
        })
    }

    fn clear(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CoreError::FileRemove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Process-local storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<Session>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded, as if a previous run had logged in
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }

    /// What is currently persisted (None after `clear`)
    pub fn snapshot(&self) -> Option<Session> {
        self.slot.lock().clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Session, CoreError> {
        Ok(self.slot.lock().clone().unwrap_or_default())
    }

    fn save(&self, session: &Session) -> Result<(), CoreError> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.slot.lock() = None;
        Ok(())
    }
}
