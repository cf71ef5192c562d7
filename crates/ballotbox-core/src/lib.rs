//! ballotbox-core - Core library for ballotbox
//!
//! Provides the session store, the voting API client, authorization gating,
//! and the auth/voting/admin flows that drive a ballotbox frontend.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod flows;
pub mod gating;
pub mod session;
pub mod shell;
pub mod storage;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use context::ClientContext;
pub use error::{ApiError, CoreError, ErrorKind, FlowError};
pub use flows::{AdminFlow, AuthFlow, Phase, VotingFlow};
pub use session::{SessionListener, SessionStore};
pub use shell::Route;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

pub use ballotbox_types as types;
