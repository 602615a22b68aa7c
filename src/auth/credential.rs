//! Unified view over the three authentication schemes
//!
//! - Bearer JWT in the `Authorization` header (API routes)
//! - Signed session cookie set by the GitHub callback
//! - Opaque token stored on the user row, checked by lookup
//!
//! The schemes stay independent; handlers only see a `Credential`.

use super::session::Session;
use super::token::Claims;

/// Which mechanism authenticated the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    Session,
    StoredToken,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "bearer",
            AuthScheme::Session => "session",
            AuthScheme::StoredToken => "stored_token",
        }
    }
}

/// Proof of identity attached to a request
#[derive(Debug, Clone)]
pub enum Credential {
    Bearer(Claims),
    Session(Session),
    StoredToken { user_id: i64, username: String },
}

impl Credential {
    pub fn scheme(&self) -> AuthScheme {
        match self {
            Credential::Bearer(_) => AuthScheme::Bearer,
            Credential::Session(_) => AuthScheme::Session,
            Credential::StoredToken { .. } => AuthScheme::StoredToken,
        }
    }

    /// Local user id the credential is bound to
    pub fn user_id(&self) -> i64 {
        match self {
            Credential::Bearer(claims) => claims.id,
            Credential::Session(session) => session.user_id,
            Credential::StoredToken { user_id, .. } => *user_id,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Credential::Bearer(claims) => &claims.username,
            Credential::Session(session) => &session.username,
            Credential::StoredToken { username, .. } => username,
        }
    }
}
