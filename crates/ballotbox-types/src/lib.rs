//! ballotbox-types - Shared data types for ballotbox
//!
//! This crate contains pure data structures without heavy dependencies.
//! No tokio, no HTTP client - just serde-serializable types.
//!
//! Used by:
//! - ballotbox-core (session store, API client, flows)
//! - ballotbox (CLI shell)

pub mod auth;
pub mod draft;
pub mod poll;
pub mod session;

pub use auth::{Credentials, LoginResponse, Registration};
pub use draft::DraftPoll;
pub use poll::{NewPoll, NewPollOption, Poll, PollOption};
pub use session::{Role, Session};
