//! HTTP client for the voting API
//!
//! One `ApiClient` per process. It owns the bearer header, which only the
//! session store may change (through `SessionListener`), and maps every
//! transport or HTTP failure onto `ApiError`.

use crate::config::ClientConfig;
use crate::error::{ApiError, CoreError};
use crate::session::SessionListener;
use ballotbox_types::{Credentials, LoginResponse, NewPoll, Poll, Registration, Role, Session};
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Error payload returned by the API (`{"message": "..."}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `POST /polls` response wrapper
#[derive(Debug, Deserialize)]
struct CreatedPoll {
    poll: Poll,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteBody<'a> {
    option_id: &'a str,
}

/// Voting API client
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    bearer: RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client for `config.base_url` with `config.timeout` on every request
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| CoreError::InvalidConfig {
            message: format!("invalid base URL '{}': {}", config.base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::InvalidConfig {
                message: format!("base URL '{}' cannot carry paths", config.base_url),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(concat!("ballotbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::InvalidConfig {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url,
            bearer: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether an `Authorization` header is currently attached
    pub fn has_bearer(&self) -> bool {
        self.bearer.read().is_some()
    }

    // ===================
    // Auth
    // ===================

    /// `POST /auth/register`
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), ApiError> {
        let body = Registration {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };
        let request = self.request(Method::POST, &["auth", "register"]).json(&body);
        self.send(request).await.map(drop)
    }

    /// `POST /auth/login`
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = Credentials::new(username, password);
        let request = self.request(Method::POST, &["auth", "login"]).json(&body);
        let response = self.send(request).await?;
        decode(response).await
    }

    // ===================
    // Polls
    // ===================

    /// `GET /polls`
    pub async fn list_polls(&self) -> Result<Vec<Poll>, ApiError> {
        let response = self.send(self.request(Method::GET, &["polls"])).await?;
        decode(response).await
    }

    /// `POST /polls`. Validation happens server-side.
    pub async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, ApiError> {
        let body = NewPoll::new(question, options);
        let request = self.request(Method::POST, &["polls"]).json(&body);
        let response = self.send(request).await?;
        decode::<CreatedPoll>(response).await.map(|c| c.poll)
    }

    /// `DELETE /polls/:id`
    pub async fn delete_poll(&self, poll_id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["polls", poll_id]);
        self.send(request).await.map(drop)
    }

    /// `POST /polls/:id/vote`
    pub async fn vote(&self, poll_id: &str, option_id: &str) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, &["polls", poll_id, "vote"])
            .json(&VoteBody { option_id });
        self.send(request).await.map(drop)
    }

    // ===================
    // Plumbing
    // ===================

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(%method, %url, "API request");

        let builder = self.http.request(method, url);
        match self.bearer.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let err = ApiError::new(status.as_u16(), error_message(status, response).await);
        warn!(status = err.status, message = %err.message, "API call failed");
        Err(err)
    }
}

impl SessionListener for ApiClient {
    fn session_changed(&self, session: &Session) {
        let mut bearer = self.bearer.write();
        *bearer = session.token.clone().filter(|t| !t.is_empty());
        debug!(attached = bearer.is_some(), "Bearer header updated");
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_bearer", &self.has_bearer())
            .finish()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::invalid_response(status, e))
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        warn!(error = %e, "API request timed out");
        ApiError::timeout()
    } else {
        warn!(error = %e, "API unreachable");
        ApiError::unreachable()
    }
}

/// Server-provided message, else the status reason phrase
async fn error_message(status: StatusCode, response: Response) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    };

    let Ok(bytes) = response.bytes().await else {
        return fallback();
    };

    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => body
            .message
            .or(body.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(fallback),
        Err(_) => fallback(),
    }
}
