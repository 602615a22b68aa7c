//! Error types for inlab
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::data::AttendanceRecord;

/// Application-wide error type
///
/// Client-side failures map to 4xx responses carrying a readable message.
/// Server-side failures map to 500 with a generic message; the cause is
/// logged but never sent to the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// User not found (404)
    #[error("User not found")]
    NotFound,

    /// Credential missing or not presented correctly (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Credential presented but invalid or expired (403)
    #[error("Access denied")]
    Forbidden,

    /// Validation error (400)
    #[error("{0}")]
    Validation(String),

    /// An open attendance record already exists for the lab (409)
    #[error("Already checked in to this lab")]
    AlreadyCheckedIn(Box<AttendanceRecord>),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (500)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// OAuth provider handshake failed (500)
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Token signing failed (500)
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Short machine-readable label, used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::AlreadyCheckedIn(_) => "conflict",
            AppError::Database(_) => "database",
            AppError::HttpClient(_) => "http_client",
            AppError::OAuth(_) => "oauth",
            AppError::Token(_) => "token",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    /// Whether this error is a unique-constraint violation reported by the store
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(sqlx::Error::Database(db_error)) if db_error.is_unique_violation()
        )
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.kind()])
            .inc();

        let (status, body) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "Unauthorized" }),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                serde_json::json!({ "error": "Forbidden" }),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            AppError::AlreadyCheckedIn(record) => (
                StatusCode::CONFLICT,
                serde_json::json!({
                    "error": self.to_string(),
                    "record": record,
                }),
            ),
            error => {
                tracing::error!(error = %error, kind = error.kind(), "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
