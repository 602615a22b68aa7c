//! Session management
//!
//! Uses HMAC-signed tokens stored in the `session` cookie.
//! No server-side session storage needed.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::data::User;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the signed session
pub const SESSION_COOKIE: &str = "session";

/// Browser session established by the GitHub callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Local user id
    pub user_id: i64,
    pub username: String,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `user` lasting `max_age_seconds`
    pub fn for_user(user: &User, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id,
            username: user.username.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid session key: {e}")))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns `Unauthorized` if the token is malformed, the signature does
/// not match, or the session is expired.
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid session key: {e}")))?;
    mac.update(payload_b64.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;
    mac.verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let session: Session =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "session-secret-that-is-32-bytes!";

    fn session(expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            user_id: 42,
            username: "octocat".to_string(),
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_round_trip() {
        let token = create_session_token(&session(Duration::hours(1)), SECRET).unwrap();
        let decoded = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(decoded.user_id, 42);
        assert_eq!(decoded.username, "octocat");
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = create_session_token(&session(Duration::hours(1)), SECRET).unwrap();
        let result = verify_session_token(&token, "another-secret-that-is-32-bytes!");
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_rejects_expired_session() {
        let token = create_session_token(&session(Duration::seconds(-5)), SECRET).unwrap();
        let result = verify_session_token(&token, SECRET);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_rejects_garbage() {
        for token in ["", "no-dot", "a.b", "!!!.???"] {
            assert!(matches!(
                verify_session_token(token, SECRET),
                Err(AppError::Unauthorized)
            ));
        }
    }
}
