//! In-process fake of the voting API, served by axum on an ephemeral port

#![allow(dead_code)]

use axum::extract::{Path, Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use ballotbox_core::types::{Poll, PollOption, Role};
use ballotbox_core::{ClientConfig, ClientContext, SessionStorage};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One request as the server saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeState {
    users: Mutex<HashMap<String, (String, Role)>>,
    tokens: Mutex<HashMap<String, String>>,
    polls: Mutex<Vec<Poll>>,
    requests: Mutex<Vec<Recorded>>,
    forced: Mutex<HashMap<(String, String), (StatusCode, Option<Value>)>>,
    delay: Mutex<Option<Duration>>,
    next_poll: AtomicUsize,
    next_option: AtomicUsize,
}

pub struct FakeApi {
    pub state: Arc<FakeState>,
    pub base_url: String,
}

impl FakeApi {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/polls", get(list_polls).post(create_poll))
            .route("/api/polls/{id}", delete(delete_poll))
            .route("/api/polls/{id}/vote", post(vote))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}/api", addr),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(&self.base_url)
            .unwrap()
            .with_timeout(Duration::from_secs(5))
    }

    pub fn context(&self, storage: impl SessionStorage + 'static) -> ClientContext {
        ClientContext::new(self.config(), storage).unwrap()
    }

    pub fn context_with(
        &self,
        config: ClientConfig,
        storage: impl SessionStorage + 'static,
    ) -> ClientContext {
        ClientContext::new(config, storage).unwrap()
    }

    // ===================
    // Seeding
    // ===================

    /// Register an account and return the token the server will accept
    pub fn seed_user(&self, username: &str, password: &str, role: Role) -> String {
        self.state
            .users
            .lock()
            .insert(username.to_string(), (password.to_string(), role));
        let token = token_for(username);
        self.state
            .tokens
            .lock()
            .insert(token.clone(), username.to_string());
        token
    }

    pub fn seed_poll(&self, id: &str, question: &str, options: &[(&str, &str, u64)]) {
        self.state.polls.lock().push(Poll {
            id: id.to_string(),
            question: question.to_string(),
            options: options
                .iter()
                .map(|(oid, name, votes)| PollOption {
                    id: oid.to_string(),
                    name: name.to_string(),
                    votes: *votes,
                })
                .collect(),
        });
    }

    /// Remove a poll server-side only (simulates another admin deleting it)
    pub fn drop_poll(&self, id: &str) {
        self.state.polls.lock().retain(|p| p.id != id);
    }

    pub fn revoke_tokens(&self) {
        self.state.tokens.lock().clear();
    }

    /// Every matching request gets this response instead of the real handler
    pub fn force(&self, method: &str, path: &str, status: StatusCode, body: Option<Value>) {
        self.state.forced.lock().insert(
            (method.to_string(), format!("/api{}", path)),
            (status, body),
        );
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }

    // ===================
    // Inspection
    // ===================

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    pub fn server_polls(&self) -> Vec<Poll> {
        self.state.polls.lock().clone()
    }
}

pub fn token_for(username: &str) -> String {
    format!("tok-{}", username)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn record(State(state): State<Arc<FakeState>>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization,
    });

    let delay = *state.delay.lock();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let forced = state.forced.lock().get(&(method, path)).cloned();
    match forced {
        Some((status, Some(body))) => (status, Json(body)).into_response(),
        Some((status, None)) => status.into_response(),
        None => next.run(req).await,
    }
}

fn caller(state: &FakeState, headers: &HeaderMap) -> Option<(String, Role)> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    let username = state.tokens.lock().get(token)?.clone();
    let role = state.users.lock().get(&username)?.1;
    Some((username, role))
}

async fn register(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    if username.is_empty() || password.is_empty() {
        return message(
            StatusCode::BAD_REQUEST,
            "Username and password are required",
        );
    }
    let Some(role) = body["role"].as_str().and_then(Role::parse) else {
        return message(StatusCode::BAD_REQUEST, "Invalid role");
    };

    let mut users = state.users.lock();
    if users.contains_key(&username) {
        return message(StatusCode::CONFLICT, "Username already exists");
    }
    users.insert(username, (password, role));
    message(StatusCode::CREATED, "User registered successfully")
}

async fn login(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let role = match state.users.lock().get(username) {
        Some((stored, role)) if stored == password => *role,
        _ => return message(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    };

    let token = token_for(username);
    state
        .tokens
        .lock()
        .insert(token.clone(), username.to_string());
    Json(json!({ "token": token, "role": role.as_str() })).into_response()
}

async fn list_polls(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    if caller(&state, &headers).is_none() {
        return message(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    let polls = state.polls.lock().clone();
    Json(polls).into_response()
}

async fn create_poll(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    match caller(&state, &headers) {
        None => return message(StatusCode::UNAUTHORIZED, "Not authenticated"),
        Some((_, Role::User)) => {
            return message(StatusCode::FORBIDDEN, "Only admins can create polls")
        }
        Some((_, Role::Admin)) => {}
    }

    let question = body["question"].as_str().unwrap_or_default().trim().to_string();
    let names: Vec<String> = body["options"]
        .as_array()
        .map(|opts| {
            opts.iter()
                .filter_map(|o| o["name"].as_str())
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default();
    if question.is_empty() || names.len() < 2 {
        return message(
            StatusCode::BAD_REQUEST,
            "A poll needs a question and at least two options",
        );
    }

    let id = format!("p{}", state.next_poll.fetch_add(1, Ordering::SeqCst) + 1);
    let poll = Poll {
        id,
        question,
        options: names
            .into_iter()
            .map(|name| PollOption {
                id: format!("o{}", state.next_option.fetch_add(1, Ordering::SeqCst) + 1),
                name,
                votes: 0,
            })
            .collect(),
    };
    state.polls.lock().push(poll.clone());
    (StatusCode::CREATED, Json(json!({ "poll": poll }))).into_response()
}

async fn delete_poll(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    match caller(&state, &headers) {
        None => return message(StatusCode::UNAUTHORIZED, "Not authenticated"),
        Some((_, Role::User)) => {
            return message(StatusCode::FORBIDDEN, "Only admins can delete polls")
        }
        Some((_, Role::Admin)) => {}
    }

    let mut polls = state.polls.lock();
    let before = polls.len();
    polls.retain(|p| p.id != id);
    if polls.len() == before {
        return message(StatusCode::NOT_FOUND, "Poll not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn vote(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    match caller(&state, &headers) {
        None => return message(StatusCode::UNAUTHORIZED, "Not authenticated"),
        Some((_, Role::Admin)) => return message(StatusCode::FORBIDDEN, "Only users can vote"),
        Some((_, Role::User)) => {}
    }

    let option_id = body["optionId"].as_str().unwrap_or_default();
    let mut polls = state.polls.lock();
    let Some(poll) = polls.iter_mut().find(|p| p.id == id) else {
        return message(StatusCode::NOT_FOUND, "Poll not found");
    };
    let Some(option) = poll.options.iter_mut().find(|o| o.id == option_id) else {
        return message(StatusCode::NOT_FOUND, "Option not found");
    };
    option.votes += 1;
    message(StatusCode::OK, "Vote recorded")
}
