//! Attendance endpoints
//!
//! All routes here sit behind the bearer middleware.

use axum::{
    Json, async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::dto::{AttendanceRequest, ToggleResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::AttendanceRecord;
use crate::error::AppError;
use crate::service::{ToggleOutcome, validate_lab_id};

/// JSON body of check-in and toggle requests
///
/// A missing or blank body reads as `{}`. Malformed JSON or a field of the
/// wrong type is a 400, never axum's plain-text 415/422.
pub struct AttendanceBody(pub AttendanceRequest);

#[async_trait]
impl<S> FromRequest<S> for AttendanceBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(AttendanceRequest::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|notes| !notes.trim().is_empty())
}

/// GET /api/attendance
pub async fn list_attendance(
    State(state): State<AppState>,
    CurrentUser(credential): CurrentUser,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let records = state.attendance.list(credential.user_id()).await?;
    Ok(Json(records))
}

/// POST /api/attendance/check-in
///
/// Refuses with 409 if the lab already has an open record.
pub async fn check_in(
    State(state): State<AppState>,
    CurrentUser(credential): CurrentUser,
    AttendanceBody(request): AttendanceBody,
) -> Result<(StatusCode, Json<AttendanceRecord>), AppError> {
    let lab_id = validate_lab_id(request.lab_id.map(|id| id.into_string()).as_deref())?;
    let notes = normalize_notes(request.notes);

    let record = state
        .attendance
        .check_in(credential.user_id(), &lab_id, notes.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/attendance/toggle
///
/// Checks out of an open record, or checks in when none is open.
pub async fn toggle(
    State(state): State<AppState>,
    CurrentUser(credential): CurrentUser,
    AttendanceBody(request): AttendanceBody,
) -> Result<Response, AppError> {
    let lab_id = validate_lab_id(request.lab_id.map(|id| id.into_string()).as_deref())?;
    let notes = normalize_notes(request.notes);

    let outcome = state
        .attendance
        .toggle(credential.user_id(), &lab_id, notes.as_deref())
        .await?;

    let status = match outcome {
        ToggleOutcome::CheckedIn(_) => StatusCode::CREATED,
        ToggleOutcome::CheckedOut { .. } => StatusCode::OK,
    };

    Ok((status, Json(ToggleResponse::from(outcome))).into_response())
}
