//! SQLite database operations
//!
//! All database access goes through this module. Queries are plain
//! parameterized SQL; business rules live in the service layer.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

const AUTH_TOKEN_HASH_PREFIX: &str = "sha256:";

/// Stored form of an opaque auth token.
///
/// Only the digest is persisted so a leaked database does not leak
/// usable tokens.
fn hash_auth_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}{}", AUTH_TOKEN_HASH_PREFIX, URL_SAFE_NO_PAD.encode(digest))
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        Self::connect_with_pool_size(path, 5).await
    }

    /// Connect with an explicit upper bound on pooled connections.
    pub async fn connect_with_pool_size(
        path: &Path,
        max_connections: u32,
    ) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(
            path = %path.display(),
            max_connections,
            "Database connected and migrated successfully"
        );

        Ok(Self { pool })
    }

    /// Round-trip to the store and return its current time.
    pub async fn current_time(&self) -> Result<DateTime<Utc>, AppError> {
        let raw: String =
            sqlx::query_scalar("SELECT strftime('%Y-%m-%dT%H:%M:%fZ', 'now')")
                .fetch_one(&self.pool)
                .await?;

        DateTime::parse_from_rfc3339(&raw)
            .map(|time| time.with_timezone(&Utc))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("unexpected timestamp {raw}: {e}")))
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get a user by local id
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by GitHub id
    pub async fn get_user_by_github_id(&self, github_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE github_id = ?")
            .bind(github_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert a user unless one with the same GitHub id exists.
    ///
    /// Atomic at the statement level, so concurrent first logins
    /// cannot create duplicates.
    ///
    /// # Returns
    /// `true` if inserted, `false` if the GitHub id was already present.
    pub async fn insert_user_if_absent(
        &self,
        user: &NewUser,
        created_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                github_id, username, name, email, avatar_url, profile_url, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(github_id) DO NOTHING
            "#,
        )
        .bind(&user.github_id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar_url)
        .bind(&user.profile_url)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Replace the user's opaque auth token.
    ///
    /// # Returns
    /// `true` if a user row was updated.
    pub async fn set_user_auth_token(&self, user_id: i64, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET auth_token = ? WHERE id = ?")
            .bind(hash_auth_token(token))
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Look up the user owning an opaque auth token
    pub async fn get_user_by_auth_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE auth_token = ?")
            .bind(hash_auth_token(token))
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // =========================================================================
    // Attendance
    // =========================================================================

    /// All records of a user, newest check-in first
    pub async fn list_attendance(&self, user_id: i64) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance WHERE user_id = ? ORDER BY check_in DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// The open record for (user, lab), if any
    pub async fn get_open_attendance(
        &self,
        user_id: i64,
        lab_id: &str,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance WHERE user_id = ? AND lab_id = ? AND check_out IS NULL",
        )
        .bind(user_id)
        .bind(lab_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Insert an open record.
    ///
    /// Fails with a unique violation if (user, lab) already has an open
    /// record.
    pub async fn insert_attendance(
        &self,
        user_id: i64,
        lab_id: &str,
        notes: Option<&str>,
        check_in: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendance (user_id, lab_id, check_in, check_out, notes)
            VALUES (?, ?, ?, NULL, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(lab_id)
        .bind(check_in)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Close the open record for (user, lab) in a single statement.
    ///
    /// Notes are replaced only when `notes` is `Some`.
    ///
    /// # Returns
    /// The closed record, or `None` if nothing was open.
    pub async fn close_open_attendance(
        &self,
        user_id: i64,
        lab_id: &str,
        notes: Option<&str>,
        check_out: DateTime<Utc>,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            UPDATE attendance
            SET check_out = ?, notes = COALESCE(?, notes)
            WHERE user_id = ? AND lab_id = ? AND check_out IS NULL
            RETURNING *
            "#,
        )
        .bind(check_out)
        .bind(notes)
        .bind(user_id)
        .bind(lab_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
