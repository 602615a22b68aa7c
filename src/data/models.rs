//! Data models
//!
//! Rust structs representing database rows.
//! Timestamps are chrono `DateTime<Utc>`, stored as RFC 3339 text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// A person who signed in through GitHub
///
/// `github_id` never changes after creation. `auth_token` is the opaque
/// token handed out by `/auth/token` and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// GitHub numeric user id, stored as text
    pub github_id: String,
    pub username: String,
    /// Display name (falls back to username)
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub profile_url: String,
    #[serde(skip_serializing, default)]
    pub auth_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub github_id: String,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub profile_url: String,
}

// =============================================================================
// Attendance
// =============================================================================

/// One visit to a lab
///
/// A record with `check_out == None` is open: the user is currently
/// checked in. At most one open record exists per (user, lab).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: i64,
    pub lab_id: String,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl AttendanceRecord {
    /// Whether the user is still checked in
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }
}
