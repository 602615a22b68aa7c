//! API request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{AttendanceRecord, User};
use crate::service::ToggleOutcome;

/// Public profile of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub profile_url: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            profile_url: user.profile_url.clone(),
        }
    }
}

/// Lab identifier as sent by clients: either a string or a number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LabId {
    Text(String),
    Number(i64),
}

impl LabId {
    pub fn into_string(self) -> String {
        match self {
            LabId::Text(text) => text,
            LabId::Number(number) => number.to_string(),
        }
    }
}

/// Body of check-in and toggle requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRequest {
    pub lab_id: Option<LabId>,
    pub notes: Option<String>,
}

/// Result of `POST /api/attendance/toggle`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// "check_in" or "check_out"
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub record: AttendanceRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl From<ToggleOutcome> for ToggleResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        let action = outcome.action().to_string();
        match outcome {
            ToggleOutcome::CheckedIn(record) => Self {
                action,
                status: Some("created".to_string()),
                record,
                duration: None,
            },
            ToggleOutcome::CheckedOut { record, duration } => Self {
                action,
                status: None,
                record,
                duration: Some(duration),
            },
        }
    }
}

/// Result of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Result of `GET /api/test-db`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseCheckResponse {
    pub message: String,
    pub time: DateTime<Utc>,
}

/// Result of `GET /auth/token`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Query of `GET /auth/verify-token`
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTokenQuery {
    pub token: Option<String>,
}

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
