//! Error types for ballotbox-core
//!
//! Three layers, all built on thiserror:
//! - `ApiError`: what the voting API (or the network) reported
//! - `CoreError`: local storage and configuration failures
//! - `FlowError`: what a flow action returns to its caller

use std::path::PathBuf;
use thiserror::Error;

/// Message used for connection failures (status 0)
pub const UNREACHABLE_MESSAGE: &str = "could not reach server";

/// Message used when a request exceeds the client timeout (status 0)
pub const TIMEOUT_MESSAGE: &str = "timeout";

// ===================
// API Errors
// ===================

/// Failure reported by the voting API or the transport underneath it
///
/// `status` is the HTTP status, or 0 when no response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (status {status})")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

/// Coarse classification used by flows to pick a recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User-correctable 4xx, shown inline
    Validation,
    /// 401/403
    Auth,
    /// 404, treated as "already gone"
    NotFound,
    /// No response received
    Network,
    /// Request exceeded the client timeout
    Timeout,
    /// 5xx
    Server,
    /// Success status but the body did not decode
    InvalidResponse,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(0, TIMEOUT_MESSAGE)
    }

    pub fn unreachable() -> Self {
        Self::new(0, UNREACHABLE_MESSAGE)
    }

    pub fn invalid_response(status: u16, detail: impl std::fmt::Display) -> Self {
        Self::new(status, format!("invalid response from server: {}", detail))
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status {
            0 if self.message == TIMEOUT_MESSAGE => ErrorKind::Timeout,
            0 => ErrorKind::Network,
            401 | 403 => ErrorKind::Auth,
            404 => ErrorKind::NotFound,
            400..=499 => ErrorKind::Validation,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::InvalidResponse,
        }
    }

    /// True for 401, which forces a logout wherever it happens
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Text suitable for an inline error banner
    pub fn user_message(&self) -> &str {
        match self.kind() {
            ErrorKind::Network | ErrorKind::Timeout => UNREACHABLE_MESSAGE,
            _ => &self.message,
        }
    }
}

// ===================
// Core Errors
// ===================

/// Local failures: persisted session and configuration files
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file: {path}")]
    FileRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML in {path}: {message}")]
    TomlParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

// ===================
// Flow Errors
// ===================

/// Outcome of a rejected or failed flow action
///
/// Flows also record the failure in their view state; the error is returned
/// so callers can branch on it without inspecting the view.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("another request is already in flight")]
    Busy,

    #[error("not allowed: {action}")]
    Forbidden { action: &'static str },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] CoreError),
}

impl FlowError {
    /// The API error underneath, if any
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            FlowError::Api(e) => Some(e),
            _ => None,
        }
    }
}
