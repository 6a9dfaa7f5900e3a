//! NPSSO sign-in flow
//!
//! The user pastes the NPSSO cookie value from their PlayStation login; it is
//! exchanged for an authorization code and then for an access/refresh token
//! pair.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::middleware::{MaybeUser, SESSION_COOKIE, session_cookie};
use super::session::{Session, SessionError, create_session_token};
use crate::AppState;
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - POST /auth/signin - Exchange an NPSSO token for a session
/// - POST /auth/signout - Clear the session cookie
/// - GET /auth/session - Current session status
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(signin))
        .route("/auth/signout", post(signout))
        .route("/auth/session", get(session_status))
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub npsso: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub token: String,
    pub account_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

/// POST /auth/signin
///
/// # Steps
/// 1. Exchange the NPSSO token for an authorization code
/// 2. Exchange the code for tokens
/// 3. Resolve the caller's account id
/// 4. Sign the session and set the cookie
async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    let npsso = request.npsso.trim();
    if npsso.is_empty() {
        return Err(AppError::Validation("npsso is required".to_string()));
    }

    let code = state.psn.exchange_npsso_for_code(npsso).await?;
    let tokens = state.psn.exchange_code_for_tokens(&code).await?;

    let account_id = match state
        .psn
        .trophy_summary(&tokens.access_token, "me")
        .await
    {
        Ok(summary) => Some(summary.account_id),
        Err(error) => {
            tracing::warn!(%error, "Could not resolve account id at sign-in");
            None
        }
    };

    let session = Session::new(
        tokens,
        account_id,
        Utc::now(),
        state.config.auth.session_max_age,
    );
    let token = create_session_token(&session, &state.config.auth.session_secret)?;

    tracing::info!(account_id = ?session.account_id, "User signed in");

    let jar = jar.add(session_cookie(
        token.clone(),
        state.config.should_use_secure_cookies(),
    ));

    Ok((
        jar,
        Json(SigninResponse {
            token,
            account_id: session.account_id,
            expires_at: session.expires_at,
        }),
    ))
}

/// POST /auth/signout
///
/// Always answers with an expired `session` cookie, whether or not the
/// request carried one.
async fn signout(jar: CookieJar) -> impl IntoResponse {
    let mut removal = Cookie::build(SESSION_COOKIE).path("/").build();
    removal.make_removal();
    (jar.add(removal), StatusCode::NO_CONTENT)
}

/// GET /auth/session
async fn session_status(MaybeUser(session): MaybeUser) -> Json<SessionStatus> {
    let status = match session {
        Some(session) => SessionStatus {
            authenticated: session.is_authorized(Utc::now()),
            account_id: session.account_id,
            expires_at: Some(session.expires_at),
            error: session.error,
        },
        None => SessionStatus::default(),
    };
    Json(status)
}
