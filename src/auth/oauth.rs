//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub and hands
//! the mobile app a bearer token when it completes.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;

use super::generate_random_token;
use super::session::{SESSION_COOKIE, Session, create_session_token};
use crate::AppState;
use crate::api::MessageResponse;
use crate::error::AppError;
use crate::metrics::LOGINS_TOTAL;

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_COOKIE_PATH: &str = "/auth/github";

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /auth/github
///
/// Redirects user to GitHub authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to GitHub with client_id, redirect_uri, scope, state
pub async fn github_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let csrf_state = generate_random_token();
    let location = state.github.authorize_url(&csrf_state)?;

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .path(OAUTH_STATE_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.auth.secure_cookies)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to(&location)))
}

/// Query parameters from GitHub callback
#[derive(Debug, Deserialize)]
pub struct GitHubCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// Set when the user declined
    error: Option<String>,
}

/// GET /auth/github/callback
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Verify CSRF state
/// 2. Exchange code for access token
/// 3. Fetch user info from GitHub
/// 4. Find or create the local user
/// 5. Set session cookie and issue a bearer token
/// 6. Redirect to the app deep link, or render a confirmation page
pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<GitHubCallbackQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    verify_csrf_state(query.state.as_deref(), &jar)?;

    if let Some(error) = query.error {
        tracing::warn!(%error, "GitHub authorization was not granted");
        return Err(AppError::Unauthorized);
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("code is required".to_string()))?;

    let access_token = state.github.exchange_code(&code).await?;
    let profile = state.github.fetch_profile(&access_token).await?;
    let user = state.identity.resolve(&profile).await?;

    let session = Session::for_user(&user, state.config.auth.session_max_age);
    let session_token = create_session_token(&session, &state.config.auth.secret)?;
    let token = state.tokens.issue(user.id, &user.username)?;

    let jar = jar
        .remove(clear_cookie(OAUTH_STATE_COOKIE, OAUTH_STATE_COOKIE_PATH))
        .add(
            Cookie::build((SESSION_COOKIE, session_token))
                .path("/")
                .http_only(true)
                .secure(state.config.auth.secure_cookies)
                .same_site(SameSite::Lax)
                .build(),
        );

    LOGINS_TOTAL.inc();

    match state.config.auth.app_redirect() {
        Some(deep_link) => {
            let separator = if deep_link.contains('?') { '&' } else { '?' };
            let location = format!(
                "{}{}token={}",
                deep_link,
                separator,
                urlencoding::encode(&token)
            );
            tracing::info!(user_id = user.id, username = %user.username, "Redirecting to app");
            Ok((jar, Redirect::to(&location)).into_response())
        }
        None => {
            tracing::info!(user_id = user.id, username = %user.username, "Signed in via browser");
            Ok((jar, Html(render_signed_in_page(&user.username, &token))).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// GET /auth/logout
///
/// Clears the session cookie. Bearer tokens stay valid until they expire.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar
        .remove(clear_cookie(SESSION_COOKIE, "/"))
        .remove(clear_cookie(OAUTH_STATE_COOKIE, OAUTH_STATE_COOKIE_PATH));

    (
        jar,
        axum::Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

// =============================================================================
// Helpers
// =============================================================================

fn clear_cookie(name: &'static str, path: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path(path).http_only(true).build();
    cookie.make_removal();
    cookie
}

/// Verify CSRF state from cookie matches callback state
fn verify_csrf_state(state: Option<&str>, jar: &CookieJar) -> Result<(), AppError> {
    let expected = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty());

    match (expected, state) {
        (Some(expected), Some(actual)) if expected == actual => Ok(()),
        _ => {
            tracing::warn!("OAuth state missing or mismatched");
            Err(AppError::Unauthorized)
        }
    }
}

fn render_signed_in_page(username: &str, token: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Signed in - inlab</title>
</head>
<body>
  <h1>Signed in as {}</h1>
  <p>You can return to the app. Your access token:</p>
  <pre>{}</pre>
</body>
</html>"#,
        html_escape::encode_text(username),
        html_escape::encode_text(token)
    )
}
