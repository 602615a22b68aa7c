//! Authentication
//!
//! Handles:
//! - GitHub OAuth flow
//! - Bearer tokens, session cookies and stored tokens
//! - Authentication middleware

mod account;
pub mod credential;
pub mod github;
mod middleware;
mod oauth;
pub mod session;
pub mod token;

pub use credential::{AuthScheme, Credential};
pub use github::GitHubClient;
pub use middleware::{CurrentUser, SessionUser, require_bearer};
pub use session::{Session, create_session_token, verify_session_token};
pub use token::{Claims, TokenIssuer};

use axum::{Router, middleware::from_fn_with_state, routing::get};
use base64::Engine as _;
use rand::RngCore;

use crate::AppState;

/// 32 random bytes, URL-safe base64
pub(crate) fn generate_random_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Create the `/auth` router
///
/// Routes:
/// - GET /github - Redirect to GitHub
/// - GET /github/callback - OAuth callback
/// - GET /logout - Clear session
/// - GET /user - Session user
/// - GET /token - Issue stored token (session)
/// - GET /verify-token - Look up stored token
/// - GET /me - Bearer user
pub fn auth_router(state: AppState) -> Router<AppState> {
    let bearer_routes = Router::new()
        .route("/me", get(account::me))
        .route_layer(from_fn_with_state(state, require_bearer));

    Router::new()
        .route("/github", get(oauth::github_redirect))
        .route("/github/callback", get(oauth::github_callback))
        .route("/logout", get(oauth::logout))
        .route("/user", get(account::session_user))
        .route("/token", get(account::issue_stored_token))
        .route("/verify-token", get(account::verify_stored_token))
        .merge(bearer_routes)
}
