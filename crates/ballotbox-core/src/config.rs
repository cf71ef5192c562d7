//! Client configuration
//!
//! Defaults, overridden by `<state_dir>/config.toml`, overridden in turn by
//! whatever the caller (CLI flags, environment) passes to the `with_*` setters.

use crate::error::CoreError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// File name of the optional config file inside the state directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration for the API client and flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Directory holding `session.json` and `config.toml`
    pub state_dir: PathBuf,

    /// Refetch the poll list after a successful vote
    pub refresh_after_vote: bool,
}

/// On-disk shape of `config.toml`; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    refresh_after_vote: Option<bool>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            state_dir: default_state_dir().unwrap_or_else(|| PathBuf::from(".ballotbox")),
            refresh_after_vote: true,
        }
    }
}

/// `~/.config/ballotbox` (or the platform equivalent)
pub fn default_state_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ballotbox"))
}

impl ClientConfig {
    /// Defaults rooted at `state_dir`, merged with its `config.toml` if present
    pub fn load(state_dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let state_dir = state_dir.into();
        let mut config = Self {
            state_dir: state_dir.clone(),
            ..Self::default()
        };

        let path = state_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| CoreError::FileRead {
            path: path.clone(),
            source,
        })?;
        config.merge_toml(&path, &content)?;
        debug!(path = %path.display(), base_url = %config.base_url, "Config file loaded");
        Ok(config)
    }

    /// Load from the platform config directory
    pub fn load_default() -> Result<Self, CoreError> {
        let dir = default_state_dir().ok_or(CoreError::ConfigDirNotFound)?;
        Self::load(dir)
    }

    fn merge_toml(&mut self, path: &Path, content: &str) -> Result<(), CoreError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| CoreError::TomlParse {
            path: path.to_path_buf(),
            message: source.to_string(),
            source,
        })?;

        if let Some(url) = file.base_url {
            self.base_url = normalize_base_url(&url)?;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs)?;
        }
        if let Some(refresh) = file.refresh_after_vote {
            self.refresh_after_vote = refresh;
        }
        Ok(())
    }

    pub fn with_base_url(mut self, url: &str) -> Result<Self, CoreError> {
        self.base_url = normalize_base_url(url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_after_vote(mut self, refresh: bool) -> Self {
        self.refresh_after_vote = refresh;
        self
    }

    /// Path of the persisted session record
    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join(crate::storage::SESSION_FILE_NAME)
    }
}

fn timeout_from_secs(secs: u64) -> Result<Duration, CoreError> {
    if secs == 0 {
        return Err(CoreError::InvalidConfig {
            message: "timeout_secs must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Trim whitespace and trailing slashes; require http(s)
pub fn normalize_base_url(url: &str) -> Result<String, CoreError> {
    let trimmed = url.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| CoreError::InvalidConfig {
        message: format!("invalid base URL '{}': {}", url, e),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::InvalidConfig {
            message: format!("base URL must be http or https, got '{}'", parsed.scheme()),
        });
    }

    Ok(trimmed.to_string())
}
