//! API layer
//!
//! HTTP handlers for:
//! - Health and database checks (public)
//! - Attendance (bearer token)
//! - Metrics (Prometheus)

mod attendance;
mod dto;
mod health;
mod metrics;

pub use dto::*;
pub use metrics::metrics_router;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::AppState;
use crate::auth::require_bearer;

/// Create the `/api` router
///
/// Health routes are public; attendance routes require a bearer token.
pub fn api_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/test-db", get(health::test_db));

    let authenticated_routes = Router::new()
        .route("/attendance", get(attendance::list_attendance))
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance/toggle", post(attendance::toggle))
        .route_layer(middleware::from_fn_with_state(state, require_bearer));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
}
