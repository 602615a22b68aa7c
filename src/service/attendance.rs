//! Attendance ledger
//!
//! Check-in/check-out bookkeeping per (user, lab). Open records are
//! closed with a single conditional UPDATE and opened with an INSERT
//! guarded by the partial unique index on open records, so concurrent
//! requests cannot leave two records open.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::data::{AttendanceRecord, Database};
use crate::error::AppError;
use crate::metrics::ATTENDANCE_EVENTS_TOTAL;

/// Result of a toggle
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// A new open record was created
    CheckedIn(AttendanceRecord),
    /// The open record was closed
    CheckedOut {
        record: AttendanceRecord,
        /// Elapsed time, e.g. "1h 30m" or "45m"
        duration: String,
    },
}

impl ToggleOutcome {
    pub fn action(&self) -> &'static str {
        match self {
            ToggleOutcome::CheckedIn(_) => "check_in",
            ToggleOutcome::CheckedOut { .. } => "check_out",
        }
    }
}

/// Format elapsed time floored to whole minutes.
///
/// `"Xh Ym"` from one hour up, `"Ym"` below. Negative spans count as zero.
pub fn format_duration(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> String {
    let minutes = (check_out - check_in).num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Trimmed, non-empty lab id
pub fn validate_lab_id(lab_id: Option<&str>) -> Result<String, AppError> {
    lab_id
        .map(str::trim)
        .filter(|lab_id| !lab_id.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::Validation("lab_id is required".to_string()))
}

/// Attendance service
pub struct AttendanceLedger {
    db: Arc<Database>,
}

impl AttendanceLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All of a user's records, newest first
    pub async fn list(&self, user_id: i64) -> Result<Vec<AttendanceRecord>, AppError> {
        self.db.list_attendance(user_id).await
    }

    /// Check out if an open record exists for the lab, otherwise check in.
    pub async fn toggle(
        &self,
        user_id: i64,
        lab_id: &str,
        notes: Option<&str>,
    ) -> Result<ToggleOutcome, AppError> {
        self.toggle_at(user_id, lab_id, notes, Utc::now()).await
    }

    /// `toggle` with an explicit clock reading
    pub async fn toggle_at(
        &self,
        user_id: i64,
        lab_id: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ToggleOutcome, AppError> {
        if let Some(outcome) = self.check_out(user_id, lab_id, notes, now).await? {
            return Ok(outcome);
        }

        match self.db.insert_attendance(user_id, lab_id, notes, now).await {
            Ok(record) => {
                self.record_check_in(&record);
                Ok(ToggleOutcome::CheckedIn(record))
            }
            Err(error) if error.is_unique_violation() => {
                // A concurrent toggle opened the record first; this one closes it.
                tracing::debug!(user_id, lab_id, "Toggle raced with a check-in");
                self.check_out(user_id, lab_id, notes, now)
                    .await?
                    .ok_or(error)
            }
            Err(error) => Err(error),
        }
    }

    /// Check in, refusing if the lab already has an open record.
    pub async fn check_in(
        &self,
        user_id: i64,
        lab_id: &str,
        notes: Option<&str>,
    ) -> Result<AttendanceRecord, AppError> {
        self.check_in_at(user_id, lab_id, notes, Utc::now()).await
    }

    /// `check_in` with an explicit clock reading
    pub async fn check_in_at(
        &self,
        user_id: i64,
        lab_id: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        if let Some(open) = self.db.get_open_attendance(user_id, lab_id).await? {
            return Err(AppError::AlreadyCheckedIn(Box::new(open)));
        }

        match self.db.insert_attendance(user_id, lab_id, notes, now).await {
            Ok(record) => {
                self.record_check_in(&record);
                Ok(record)
            }
            Err(error) if error.is_unique_violation() => {
                match self.db.get_open_attendance(user_id, lab_id).await? {
                    Some(open) => Err(AppError::AlreadyCheckedIn(Box::new(open))),
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }

    async fn check_out(
        &self,
        user_id: i64,
        lab_id: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<ToggleOutcome>, AppError> {
        let Some(record) = self
            .db
            .close_open_attendance(user_id, lab_id, notes, now)
            .await?
        else {
            return Ok(None);
        };

        let duration = format_duration(record.check_in, record.check_out.unwrap_or(now));
        ATTENDANCE_EVENTS_TOTAL
            .with_label_values(&["check_out"])
            .inc();
        tracing::info!(
            user_id,
            lab_id,
            record_id = record.id,
            duration = %duration,
            action = "check_out",
            "Checked out"
        );

        Ok(Some(ToggleOutcome::CheckedOut { record, duration }))
    }

    fn record_check_in(&self, record: &AttendanceRecord) {
        ATTENDANCE_EVENTS_TOTAL
            .with_label_values(&["check_in"])
            .inc();
        tracing::info!(
            user_id = record.user_id,
            lab_id = %record.lab_id,
            record_id = record.id,
            action = "check_in",
            "Checked in"
        );
    }
}
