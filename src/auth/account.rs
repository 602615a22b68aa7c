//! Endpoints answering "who am I" for each authentication scheme,
//! plus issuance and lookup of the opaque stored token.

use axum::{
    Json,
    extract::{Query, State},
};

use super::credential::AuthScheme;
use super::generate_random_token;
use super::middleware::{CurrentUser, SessionUser};
use crate::AppState;
use crate::api::{AuthTokenResponse, UserResponse, VerifyTokenQuery};
use crate::error::AppError;
use crate::metrics::AUTH_FAILURES_TOTAL;

/// GET /auth/me
///
/// Profile of the bearer token's user.
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(credential): CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .db
        .get_user(credential.user_id())
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /auth/user
///
/// Profile of the user behind the session cookie.
pub async fn session_user(
    State(state): State<AppState>,
    SessionUser(credential): SessionUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .db
        .get_user(credential.user_id())
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /auth/token
///
/// Issues a fresh opaque token for the session's user, replacing any
/// previous one.
pub async fn issue_stored_token(
    State(state): State<AppState>,
    SessionUser(credential): SessionUser,
) -> Result<Json<AuthTokenResponse>, AppError> {
    let token = generate_random_token();

    if !state
        .db
        .set_user_auth_token(credential.user_id(), &token)
        .await?
    {
        return Err(AppError::Unauthorized);
    }

    let user = state
        .db
        .get_user(credential.user_id())
        .await?
        .ok_or(AppError::Unauthorized)?;

    tracing::info!(user_id = user.id, "Stored auth token issued");

    Ok(Json(AuthTokenResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// GET /auth/verify-token?token=
///
/// Resolves an opaque token to its user by lookup.
pub async fn verify_stored_token(
    State(state): State<AppState>,
    Query(query): Query<VerifyTokenQuery>,
) -> Result<Json<UserResponse>, AppError> {
    let token = query
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Validation("token is required".to_string()))?;

    let Some(user) = state.db.get_user_by_auth_token(&token).await? else {
        AUTH_FAILURES_TOTAL
            .with_label_values(&[AuthScheme::StoredToken.as_str(), "unauthorized"])
            .inc();
        return Err(AppError::Unauthorized);
    };

    tracing::debug!(
        user_id = user.id,
        scheme = AuthScheme::StoredToken.as_str(),
        "Stored token verified"
    );

    Ok(Json(UserResponse::from(&user)))
}
