//! inlab server binary

use inlab::{AppState, config::AppConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `inlab` logs at `level` and
/// `tower_http` at debug. `format` is `json` or anything else for pretty.
fn init_tracing(format: &str, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("inlab={level},tower_http=debug")));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging is configured before AppConfig exists, so read it straight
    // from the environment (including `.env`).
    let _ = dotenvy::dotenv();
    let env_or = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.into());
    init_tracing(
        &env_or("INLAB__LOGGING__FORMAT", "pretty"),
        &env_or("INLAB__LOGGING__LEVEL", "info"),
    );

    inlab::metrics::init_metrics();

    let config = AppConfig::load()?;
    let addr = config.server.bind_addr();
    tracing::info!(
        database = %config.database.path.display(),
        callback_url = %config.auth.github.callback_url,
        app_redirect = config.auth.app_redirect().unwrap_or("<html page>"),
        "Configuration loaded"
    );

    let app = inlab::build_router(AppState::new(config).await?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "inlab listening");
    axum::serve(listener, app).await?;

    Ok(())
}
