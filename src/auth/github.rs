//! GitHub OAuth client
//!
//! Plain HTTP calls for the authorization code flow:
//! authorize URL, code exchange, profile and e-mail fetch.

use serde::Deserialize;

use crate::config::GitHubOAuthConfig;
use crate::error::AppError;
use crate::service::ProviderProfile;

/// GitHub token response
#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GitHub user info (`GET /user`)
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
    html_url: String,
}

/// Entry of `GET /user/emails`
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}

/// Client for the GitHub OAuth app configured in `auth.github`
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubOAuthConfig,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, config: GitHubOAuthConfig) -> Self {
        Self { http, config }
    }

    /// URL the browser is sent to, carrying the CSRF `state`
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let url = url::Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Config(format!("auth.github.authorize_url: {e}")))?;

        Ok(url.to_string())
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response: GitHubTokenResponse = self
            .http
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response {
            GitHubTokenResponse {
                access_token: Some(token),
                ..
            } => Ok(token),
            GitHubTokenResponse {
                error,
                error_description,
                ..
            } => Err(AppError::OAuth(format!(
                "code exchange failed: {} ({})",
                error.unwrap_or_else(|| "no access token".to_string()),
                error_description.unwrap_or_default()
            ))),
        }
    }

    /// Fetch the signed-in user's profile
    ///
    /// E-mails come from `/user/emails` when the `user:email` scope was
    /// requested; otherwise only the public e-mail is known.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AppError> {
        let api_url = self.config.api_url.trim_end_matches('/');

        let user: GitHubUser = self
            .http
            .get(format!("{api_url}/user"))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let emails = if self.config.scope.contains("user:email") {
            match self.fetch_emails(api_url, access_token).await {
                Ok(emails) => emails,
                Err(error) => {
                    tracing::warn!(%error, login = %user.login, "Failed to fetch GitHub e-mails");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(profile_from_github(user, emails))
    }

    async fn fetch_emails(
        &self,
        api_url: &str,
        access_token: &str,
    ) -> Result<Vec<GitHubEmail>, AppError> {
        let emails = self
            .http
            .get(format!("{api_url}/user/emails"))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(emails)
    }
}

/// Primary verified address first, then other verified ones; the public
/// profile e-mail when nothing verified is available.
fn profile_from_github(user: GitHubUser, mut emails: Vec<GitHubEmail>) -> ProviderProfile {
    emails.retain(|email| email.verified);
    emails.sort_by_key(|email| !email.primary);

    let mut addresses: Vec<String> = emails.into_iter().map(|email| email.email).collect();
    if addresses.is_empty() {
        addresses.extend(user.email);
    }

    ProviderProfile {
        external_id: user.id.to_string(),
        username: user.login,
        display_name: user.name,
        emails: addresses,
        photos: user.avatar_url.into_iter().collect(),
        profile_url: user.html_url,
    }
}
