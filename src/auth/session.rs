//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::psn::AuthTokens;

/// Why a session can no longer be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionError {
    /// The refresh token was rejected; the user has to sign in again
    RefreshAccessTokenError,
}

/// User session data
///
/// Stored in a signed cookie. Carries the PSN credentials obtained at
/// sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// PSN token pair
    pub authorization: AuthTokens,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    /// Numeric PSN account id of the signed-in user
    pub account_id: Option<String>,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When the session cookie stops being accepted
    pub session_expires_at: DateTime<Utc>,
    #[serde(default)]
    pub error: Option<SessionError>,
}

impl Session {
    /// Start a session from a fresh token pair
    pub fn new(
        tokens: AuthTokens,
        account_id: Option<String>,
        now: DateTime<Utc>,
        max_age_seconds: i64,
    ) -> Self {
        Self {
            expires_at: now + Duration::seconds(tokens.expires_in),
            authorization: tokens,
            account_id,
            created_at: now,
            session_expires_at: now + Duration::seconds(max_age_seconds),
            error: None,
        }
    }

    /// The access token has expired and must be refreshed before use
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Replace the credentials after a successful refresh
    pub fn refreshed(self, tokens: AuthTokens, now: DateTime<Utc>) -> Self {
        Self {
            expires_at: now + Duration::seconds(tokens.expires_in),
            authorization: tokens,
            error: None,
            ..self
        }
    }

    pub fn with_error(self, error: SessionError) -> Self {
        Self {
            error: Some(error),
            ..self
        }
    }

    /// Usable for upstream calls right now
    pub fn is_authorized(&self, now: DateTime<Utc>) -> bool {
        self.error.is_none() && !self.needs_refresh(now)
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.session_expires_at < Utc::now()
    }

    pub fn access_token(&self) -> &str {
        &self.authorization.access_token
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `session` - Session data to encode
/// * `secret` - HMAC secret key
pub fn create_session_token(
    session: &Session,
    secret: &str,
) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};

    let payload =
        serde_json::to_string(session).map_err(|e| crate::error::AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let signature = sign(&payload_b64, secret)?;
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// `AppError::Unauthorized` if the signature is invalid, the token is
/// malformed or the session has expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, crate::error::AppError> {
    use crate::error::AppError;
    use base64::{Engine as _, engine::general_purpose};
    use hmac::Mac;

    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;
    if signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    let provided_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let mut mac = hmac_for(secret)?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&provided_signature)
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

type HmacSha256 = hmac::Hmac<sha2::Sha256>;

fn hmac_for(secret: &str) -> Result<HmacSha256, crate::error::AppError> {
    use hmac::Mac;

    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Encryption(e.to_string()))
}

fn sign(payload_b64: &str, secret: &str) -> Result<Vec<u8>, crate::error::AppError> {
    use hmac::Mac;

    let mut mac = hmac_for(secret)?;
    mac.update(payload_b64.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
