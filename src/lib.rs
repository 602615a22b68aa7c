//! inlab: lab attendance backend
//!
//! Users sign in with GitHub and get a short-lived bearer token; with it
//! they check in to and out of labs. Requests flow
//! `api`/`auth` handlers → `service` → `data` (SQLite via sqlx).
//!
//! - `api`: `/api` routes (health, attendance) and `/metrics`
//! - `auth`: GitHub OAuth, bearer tokens, session cookies, stored tokens
//! - `service`: identity resolution and the attendance ledger
//! - `data`: connection pool, migrations and queries
//! - `config`, `error`, `metrics`: ambient plumbing

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Handles shared by every request, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,

    /// Pooled SQLite connection
    pub db: Arc<data::Database>,

    /// Bearer token signer/verifier
    pub tokens: Arc<auth::TokenIssuer>,

    /// GitHub OAuth client
    pub github: Arc<auth::GitHubClient>,

    /// Find-or-create users from GitHub profiles
    pub identity: Arc<service::IdentityResolver>,

    /// Check-in/check-out bookkeeping
    pub attendance: Arc<service::AttendanceLedger>,
}

impl AppState {
    /// Open the database (running migrations) and wire services.
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let db = Arc::new(
            data::Database::connect_with_pool_size(
                &config.database.path,
                config.database.max_connections,
            )
            .await?,
        );

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("inlab/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        let tokens = auth::TokenIssuer::new(&config.auth.secret, config.auth.token_ttl_seconds);
        let github = auth::GitHubClient::new(http_client, config.auth.github.clone());

        Ok(Self {
            config: Arc::new(config),
            identity: Arc::new(service::IdentityResolver::new(db.clone())),
            attendance: Arc::new(service::AttendanceLedger::new(db.clone())),
            db,
            tokens: Arc::new(tokens),
            github: Arc::new(github),
        })
    }
}

/// Full HTTP surface: `/api`, `/auth` and `/metrics`, with request
/// tracing and permissive CORS (any origin, credentials allowed).
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower::ServiceBuilder;
    use tower_http::{cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .nest("/api", api::api_router(state.clone()))
        .nest("/auth", auth::auth_router(state.clone()))
        .merge(api::metrics_router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::very_permissive()),
        )
        .with_state(state)
}
