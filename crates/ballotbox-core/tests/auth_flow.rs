//! Login, registration and logout against the fake API

mod common;

use ballotbox_core::flows::auth::REGISTERED_NOTICE;
use ballotbox_core::shell::{self, Route};
use ballotbox_core::types::{Role, Session};
use ballotbox_core::{ErrorKind, FlowError, MemoryStorage};
use common::FakeApi;

#[tokio::test]
async fn test_admin_login_establishes_session_and_admin_route() {
    let api = FakeApi::spawn().await;
    api.seed_user("alice", "pw", Role::Admin);
    // Server hands out {token: "abc", role: "admin"}
    api.force(
        "POST",
        "/auth/login",
        axum::http::StatusCode::OK,
        Some(serde_json::json!({"token": "abc", "role": "admin"})),
    );
    let ctx = api.context(MemoryStorage::new());
    let auth = ctx.auth_flow();

    let session = auth.login("alice", "pw").await.unwrap();

    assert_eq!(session, Session::new("abc", Some(Role::Admin)));
    assert_eq!(ctx.session.get(), Session::new("abc", Some(Role::Admin)));
    assert_eq!(shell::resolve(Route::Admin, &ctx.session.get()), Route::Admin);
    assert!(ctx.admin_flow().controls_enabled());
    assert!(ctx.api.has_bearer());
}

#[tokio::test]
async fn test_bad_credentials_leave_session_untouched() {
    let api = FakeApi::spawn().await;
    api.seed_user("alice", "pw", Role::User);
    let ctx = api.context(MemoryStorage::with_session(Session::new(
        "existing",
        Some(Role::User),
    )));
    let auth = ctx.auth_flow();

    let err = auth.login("alice", "wrong").await.unwrap_err();

    assert_eq!(err.api().map(|e| e.status), Some(401));
    assert_eq!(auth.view().error.as_deref(), Some("Invalid credentials"));
    assert!(!auth.view().submitting);
    assert_eq!(ctx.session.get().token.as_deref(), Some("existing"));
}

#[tokio::test]
async fn test_unknown_role_logs_in_without_rights() {
    let api = FakeApi::spawn().await;
    api.force(
        "POST",
        "/auth/login",
        axum::http::StatusCode::OK,
        Some(serde_json::json!({"token": "abc", "role": "moderator"})),
    );
    let ctx = api.context(MemoryStorage::new());

    let session = ctx.auth_flow().login("mod", "pw").await.unwrap();

    assert_eq!(session.role, None);
    assert!(!ctx.voting_flow().voting_enabled());
    assert!(!ctx.admin_flow().controls_enabled());
    assert_eq!(shell::resolve(Route::Vote, &session), Route::Vote);
}

#[tokio::test]
async fn test_register_then_login() {
    let api = FakeApi::spawn().await;
    let ctx = api.context(MemoryStorage::new());
    let auth = ctx.auth_flow();

    auth.register("bob", "pw", Role::User).await.unwrap();
    assert_eq!(auth.view().notice.as_deref(), Some(REGISTERED_NOTICE));
    // Registration alone does not log in
    assert!(!ctx.session.get().is_authenticated());

    let session = auth.login("bob", "pw").await.unwrap();
    assert_eq!(session.role, Some(Role::User));
    assert!(auth.view().notice.is_none());

    let register = &api.requests()[0];
    assert_eq!(register.method, "POST");
    assert_eq!(register.path, "/api/auth/register");
}

#[tokio::test]
async fn test_duplicate_registration_surfaces_message() {
    let api = FakeApi::spawn().await;
    api.seed_user("bob", "pw", Role::User);
    let ctx = api.context(MemoryStorage::new());
    let auth = ctx.auth_flow();

    let err = auth.register("bob", "other", Role::Admin).await.unwrap_err();

    assert!(matches!(err, FlowError::Api(ref e) if e.status == 409));
    assert_eq!(auth.view().error.as_deref(), Some("Username already exists"));
}

#[tokio::test]
async fn test_logout_clears_session_and_header() {
    let api = FakeApi::spawn().await;
    api.seed_user("alice", "pw", Role::User);
    let ctx = api.context(MemoryStorage::new());
    let auth = ctx.auth_flow();

    auth.login("alice", "pw").await.unwrap();
    assert!(ctx.api.has_bearer());

    auth.logout().unwrap();
    assert_eq!(ctx.session.get(), Session::default());
    assert!(!ctx.api.has_bearer());
    assert_eq!(
        shell::nav_links(&ctx.session.get()),
        vec![Route::Home, Route::Login, Route::Register]
    );
}

#[tokio::test]
async fn test_login_without_token_leaves_session_alone() {
    let api = FakeApi::spawn().await;
    api.force(
        "POST",
        "/auth/login",
        axum::http::StatusCode::OK,
        Some(serde_json::json!({"token": "", "role": "user"})),
    );
    let ctx = api.context(MemoryStorage::new());
    let auth = ctx.auth_flow();

    let err = auth.login("ghost", "pw").await.unwrap_err();

    assert_eq!(err.api().map(|e| e.kind()), Some(ErrorKind::InvalidResponse));
    assert_eq!(ctx.session.get(), Session::default());
    assert!(!ctx.voting_flow().voting_enabled());
    assert!(auth.view().error.is_some());
}
