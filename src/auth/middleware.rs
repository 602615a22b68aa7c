//! Authentication middleware
//!
//! Protects routes that require authentication.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::credential::{AuthScheme, Credential};
use super::session::{SESSION_COOKIE, verify_session_token};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::AUTH_FAILURES_TOTAL;

fn record_failure(scheme: AuthScheme, error: &AppError) {
    AUTH_FAILURES_TOTAL
        .with_label_values(&[scheme.as_str(), error.kind()])
        .inc();
}

/// Token from `Authorization: Bearer <token>`, if well-formed
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Missing or malformed header is `Unauthorized`;
/// a token that fails verification is `Forbidden`.
fn authenticate_bearer(headers: &HeaderMap, state: &AppState) -> Result<Credential, AppError> {
    let result = extract_bearer_token(headers)
        .ok_or(AppError::Unauthorized)
        .and_then(|token| state.tokens.verify(token))
        .map(Credential::Bearer);

    if let Err(error) = &result {
        record_failure(AuthScheme::Bearer, error);
    }
    result
}

fn authenticate_session(headers: &HeaderMap, state: &AppState) -> Result<Credential, AppError> {
    let jar = CookieJar::from_headers(headers);
    let result = jar
        .get(SESSION_COOKIE)
        .ok_or(AppError::Unauthorized)
        .and_then(|cookie| verify_session_token(cookie.value(), &state.config.auth.secret))
        .map(Credential::Session);

    if let Err(error) = &result {
        record_failure(AuthScheme::Session, error);
    }
    result
}

/// Middleware to require a bearer token
///
/// Adds the verified `Credential` to request extensions.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/attendance", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_bearer));
/// ```
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let credential = authenticate_bearer(request.headers(), &state)?;
    request.extensions_mut().insert(credential);

    Ok(next.run(request).await)
}

/// Extractor for the bearer-authenticated caller
///
/// Reuses the credential stored by `require_bearer` when present.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(credential): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", credential.username())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Credential);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(credential) = parts.extensions.get::<Credential>() {
            if credential.scheme() == AuthScheme::Bearer {
                return Ok(CurrentUser(credential.clone()));
            }
        }

        let state = AppState::from_ref(state);
        let credential = authenticate_bearer(&parts.headers, &state)?;
        parts.extensions.insert(credential.clone());

        Ok(CurrentUser(credential))
    }
}

/// Extractor for the caller identified by the session cookie
#[derive(Debug, Clone)]
pub struct SessionUser(pub Credential);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate_session(&parts.headers, &state).map(SessionUser)
    }
}
