//! Common test utilities for E2E tests

#![allow(dead_code)]

use chrono::Utc;
use inlab::data::{NewUser, User};
use inlab::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "test-secret-key-that-is-32-bytes-long!!";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Test configuration; GitHub endpoints point at `github_base`
pub fn test_config(db_path: std::path::PathBuf, github_base: &str) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: config::DatabaseConfig {
            path: db_path,
            max_connections: 5,
        },
        auth: config::AuthConfig {
            secret: TEST_SECRET.to_string(),
            token_ttl_seconds: 3600,
            session_max_age: 86400,
            secure_cookies: false,
            app_redirect_url: "myapp://login".to_string(),
            github: config::GitHubOAuthConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                callback_url: "http://10.0.2.2:3001/auth/github/callback".to_string(),
                scope: "user:email".to_string(),
                authorize_url: format!("{github_base}/login/oauth/authorize"),
                token_url: format!("{github_base}/login/oauth/access_token"),
                api_url: github_base.to_string(),
            },
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}, "https://github.com").await
    }

    /// Test server whose GitHub endpoints live under `github_base`
    pub async fn with_github(github_base: &str) -> Self {
        Self::with_config(|_| {}, github_base).await
    }

    /// Test server with a tweaked configuration
    pub async fn with_config(customize: impl FnOnce(&mut config::AppConfig), github_base: &str) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path().join("test.db"), github_base);
        customize(&mut config);

        inlab::metrics::init_metrics();

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = inlab::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a user row directly in the database
    pub async fn create_test_user(&self, github_id: &str, username: &str) -> User {
        let new_user = NewUser {
            github_id: github_id.to_string(),
            username: username.to_string(),
            name: format!("{username} (test)"),
            email: Some(format!("{username}@example.com")),
            avatar_url: None,
            profile_url: format!("https://github.com/{username}"),
        };

        self.state
            .db
            .insert_user_if_absent(&new_user, Utc::now())
            .await
            .unwrap();
        self.state
            .db
            .get_user_by_github_id(github_id)
            .await
            .unwrap()
            .expect("user was just inserted")
    }

    /// Bearer token for a user
    pub fn bearer_token(&self, user: &User) -> String {
        self.state
            .tokens
            .issue(user.id, &user.username)
            .expect("Failed to create test token")
    }

    /// Signed session cookie value for a user
    pub fn session_cookie(&self, user: &User) -> String {
        use inlab::auth::session::{SESSION_COOKIE, Session, create_session_token};

        let session = Session::for_user(user, self.state.config.auth.session_max_age);
        let token = create_session_token(&session, &self.state.config.auth.secret)
            .expect("Failed to create test session");
        format!("{SESSION_COOKIE}={token}")
    }
}

/// Client that surfaces redirects instead of following them
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build no-redirect client")
}
