//! Route resolution for the view shell
//!
//! Decides which page a session may see. Flows re-check the same predicates
//! before calling the API, so a bypassed route still cannot act.

use crate::gating::{can_administer, is_authenticated};
use ballotbox_types::Session;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Vote,
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Vote => "/vote",
            Route::Admin => "/admin",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Vote => "Vote",
            Route::Admin => "Admin",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Home),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            "/vote" => Some(Route::Vote),
            "/admin" => Some(Route::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a request for `requested` actually lands
///
/// `/vote` needs any session and falls back to `/login`; `/admin` needs an
/// admin session and falls back to `/`.
pub fn resolve(requested: Route, session: &Session) -> Route {
    match requested {
        Route::Vote if !is_authenticated(session) => Route::Login,
        Route::Admin if !can_administer(session) => Route::Home,
        other => other,
    }
}

/// Navigation entries offered to `session`
pub fn nav_links(session: &Session) -> Vec<Route> {
    if !is_authenticated(session) {
        return vec![Route::Home, Route::Login, Route::Register];
    }

    let mut links = vec![Route::Home, Route::Vote];
    if can_administer(session) {
        links.push(Route::Admin);
    }
    links
}

/// Whether a logout control should be shown
pub fn shows_logout(session: &Session) -> bool {
    is_authenticated(session)
}
