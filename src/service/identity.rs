//! Identity resolution
//!
//! Maps a GitHub profile onto a local user row, creating it on first login.

use chrono::Utc;
use std::sync::Arc;

use crate::data::{Database, NewUser, User};
use crate::error::AppError;
use crate::metrics::USERS_CREATED_TOTAL;

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// Identity data returned by the OAuth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Provider-side user id
    pub external_id: String,
    pub username: String,
    pub display_name: Option<String>,
    /// Addresses in preference order
    pub emails: Vec<String>,
    /// Avatar URLs in preference order
    pub photos: Vec<String>,
    pub profile_url: String,
}

impl ProviderProfile {
    fn to_new_user(&self) -> NewUser {
        NewUser {
            github_id: self.external_id.clone(),
            username: self.username.clone(),
            name: normalize_optional_text(self.display_name.as_deref())
                .unwrap_or_else(|| self.username.clone()),
            email: normalize_optional_text(self.emails.first().map(String::as_str)),
            avatar_url: normalize_optional_text(self.photos.first().map(String::as_str)),
            profile_url: self.profile_url.clone(),
        }
    }
}

/// Finds or creates users keyed by provider id
pub struct IdentityResolver {
    db: Arc<Database>,
}

impl IdentityResolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Resolve a provider profile to a local user
    ///
    /// An existing user is returned unchanged: later logins do not sync
    /// name, e-mail or avatar from the provider.
    pub async fn resolve(&self, profile: &ProviderProfile) -> Result<User, AppError> {
        if let Some(user) = self.db.get_user_by_github_id(&profile.external_id).await? {
            tracing::debug!(user_id = user.id, username = %user.username, "Existing user signed in");
            return Ok(user);
        }

        let created = self
            .db
            .insert_user_if_absent(&profile.to_new_user(), Utc::now())
            .await?;

        let user = self
            .db
            .get_user_by_github_id(&profile.external_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "user {} missing right after insert",
                    profile.external_id
                ))
            })?;

        if created {
            USERS_CREATED_TOTAL.inc();
            tracing::info!(user_id = user.id, username = %user.username, "User created");
        }

        Ok(user)
    }
}
