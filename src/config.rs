//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override, `.env` honoured)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (default: 3001)
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration (SQLite only)
///
/// A file path replaces the host/port/name/user/password of a networked server.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign bearer tokens and session cookies (32+ bytes)
    pub secret: String,
    /// Bearer token lifetime in seconds (default: 3600)
    pub token_ttl_seconds: i64,
    /// Session cookie max age in seconds (default: 86400 = 24h)
    pub session_max_age: i64,
    /// Mark cookies `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
    /// Deep link the OAuth callback redirects to with `?token=`.
    ///
    /// When empty, the callback renders an HTML confirmation page instead.
    #[serde(default)]
    pub app_redirect_url: String,
    pub github: GitHubOAuthConfig,
}

impl AuthConfig {
    /// Deep link target, if redirecting is enabled
    pub fn app_redirect(&self) -> Option<&str> {
        let trimmed = self.app_redirect_url.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// GitHub OAuth configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with the GitHub OAuth app
    pub callback_url: String,
    /// Requested OAuth scope (default: "user:email")
    pub scope: String,
    pub authorize_url: String,
    pub token_url: String,
    /// REST API base (default: "https://api.github.com")
    pub api_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (INLAB__*), including those from `.env`
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded environment file");
        }

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("database.path", "data/inlab.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.token_ttl_seconds", 3600)?
            .set_default("auth.session_max_age", 86400)?
            .set_default("auth.secure_cookies", false)?
            .set_default("auth.app_redirect_url", "myapp://login")?
            .set_default(
                "auth.github.callback_url",
                "http://10.0.2.2:3001/auth/github/callback",
            )?
            .set_default("auth.github.scope", "user:email")?
            .set_default(
                "auth.github.authorize_url",
                "https://github.com/login/oauth/authorize",
            )?
            .set_default(
                "auth.github.token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("auth.github.api_url", "https://api.github.com")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("INLAB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SECRET_BYTES: usize = 32;

        if self.auth.secret.len() < MIN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        if self.auth.token_ttl_seconds <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.token_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(crate::error::AppError::Config(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("auth.github.callback_url", &self.auth.github.callback_url),
            ("auth.github.authorize_url", &self.auth.github.authorize_url),
            ("auth.github.token_url", &self.auth.github.token_url),
            ("auth.github.api_url", &self.auth.github.api_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                crate::error::AppError::Config(format!("{key} is not a valid URL: {e}"))
            })?;
        }

        if !self.auth.secure_cookies {
            tracing::warn!("Using insecure session cookies");
        }

        Ok(())
    }
}
