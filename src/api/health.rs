//! Liveness and database connectivity checks

use axum::{Json, extract::State};

use super::dto::{DatabaseCheckResponse, HealthResponse};
use crate::AppState;

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is up and running!".to_string(),
    })
}

/// GET /api/test-db
///
/// Reports the store's clock. Failure is answered here rather than through
/// `AppError` so the response names the database explicitly.
pub async fn test_db(State(state): State<AppState>) -> axum::response::Response {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    match state.db.current_time().await {
        Ok(time) => Json(DatabaseCheckResponse {
            message: "Database connection successful!".to_string(),
            time,
        })
        .into_response(),
        Err(error) => {
            tracing::error!(%error, "Database connectivity check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Database connection failed!" })),
            )
                .into_response()
        }
    }
}
