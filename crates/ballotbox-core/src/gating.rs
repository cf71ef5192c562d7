//! Authorization predicates
//!
//! The same checks guard both the shell (which routes/actions are offered)
//! and the flows (which refuse to issue a request when they fail).

use ballotbox_types::{Role, Session};

/// Any session with a non-empty token
pub fn is_authenticated(session: &Session) -> bool {
    session.is_authenticated()
}

/// Token present and role is `user`
pub fn can_vote(session: &Session) -> bool {
    session.effective_role() == Some(Role::User)
}

/// Token present and role is `admin`
pub fn can_administer(session: &Session) -> bool {
    session.effective_role() == Some(Role::Admin)
}
