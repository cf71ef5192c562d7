//! Session and role model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an authenticated account may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May vote
    User,
    /// May create and delete polls
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Lenient parse: unknown strings mean "no role"
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The client's record of being authenticated
///
/// `role` only means something while `token` is present. Token and role
/// always change together through the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<Role>,
}

impl Session {
    /// An empty token is no session at all, so it yields the logged-out
    /// session and the role is dropped with it.
    pub fn new(token: impl Into<String>, role: Option<Role>) -> Self {
        let token = token.into();
        if token.is_empty() {
            return Self::default();
        }
        Self {
            token: Some(token),
            role,
        }
    }

    /// Empty session (logged out)
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Role, but only when backed by a token
    pub fn effective_role(&self) -> Option<Role> {
        if self.is_authenticated() {
            self.role
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_lenient() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("moderator"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_wire_strings() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_role_without_token_is_ignored() {
        let orphan = Session {
            token: None,
            role: Some(Role::Admin),
        };
        assert!(!orphan.is_authenticated());
        assert_eq!(orphan.effective_role(), None);

        let full = Session::new("abc", Some(Role::Admin));
        assert_eq!(full.effective_role(), Some(Role::Admin));
    }

    #[test]
    fn test_empty_token_is_logged_out() {
        assert_eq!(Session::new("", Some(Role::User)), Session::default());

        let hand_built = Session {
            token: Some(String::new()),
            role: Some(Role::Admin),
        };
        assert!(!hand_built.is_authenticated());
        assert_eq!(hand_built.effective_role(), None);
    }
}
