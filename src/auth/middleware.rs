//! Authentication middleware
//!
//! Resolves the session on every request and refreshes the PSN access token
//! when it has expired.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{HeaderMap, HeaderValue, Request, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};

use super::session::{Session, SessionError, create_session_token, verify_session_token};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::SESSION_REFRESHES_TOTAL;

pub(crate) const SESSION_COOKIE: &str = "session";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

/// Build the session cookie for a signed token
pub(crate) fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Exchange the refresh token once
///
/// A failed refresh does not fail the request; the session is marked and
/// `CurrentUser` rejects it later.
async fn refresh_session(state: &AppState, session: Session, now: DateTime<Utc>) -> Session {
    match state
        .psn
        .refresh_tokens(&session.authorization.refresh_token)
        .await
    {
        Ok(tokens) => {
            SESSION_REFRESHES_TOTAL.with_label_values(&["success"]).inc();
            tracing::info!(account_id = ?session.account_id, "Access token refreshed");
            session.refreshed(tokens, now)
        }
        Err(error) => {
            SESSION_REFRESHES_TOTAL.with_label_values(&["failure"]).inc();
            tracing::warn!(
                account_id = ?session.account_id,
                %error,
                "Access token refresh failed"
            );
            session.with_error(SessionError::RefreshAccessTokenError)
        }
    }
}

fn response_sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

/// Session resolution middleware
///
/// Verifies the token from the `Authorization` header or the session cookie
/// and stores the `Session` in request extensions. Invalid tokens are
/// ignored. When the access token has expired it is refreshed once and the
/// updated session is written back as a cookie.
///
/// # Usage
/// ```ignore
/// let app = Router::new()
///     .route("/api/...", ...)
///     .layer(middleware::from_fn_with_state(state, resolve_session));
/// ```
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let mut reissue = None;

    if let Some(token) = extract_token_from_headers(request.headers()) {
        match verify_session_token(&token, &state.config.auth.session_secret) {
            Ok(session) => {
                let now = Utc::now();
                let session = if session.error.is_none() && session.needs_refresh(now) {
                    let session = refresh_session(&state, session, now).await;
                    reissue = Some(session.clone());
                    session
                } else {
                    session
                };
                request.extensions_mut().insert(session);
            }
            Err(_) => tracing::debug!("Ignoring invalid session token"),
        }
    }

    let mut response = next.run(request).await;

    // Handlers that set or clear the cookie themselves take precedence
    if let Some(session) = reissue {
        if !response_sets_session_cookie(&response) {
            match create_session_token(&session, &state.config.auth.session_secret) {
                Ok(token) => {
                    let cookie =
                        session_cookie(token, state.config.should_use_secure_cookies());
                    match HeaderValue::from_str(&cookie.to_string()) {
                        Ok(value) => {
                            response.headers_mut().append(SET_COOKIE, value);
                        }
                        Err(error) => {
                            tracing::error!(%error, "Failed to encode refreshed session cookie")
                        }
                    }
                }
                Err(error) => tracing::error!(%error, "Failed to sign refreshed session"),
            }
        }
    }

    response
}

/// Extractor for current authenticated user
///
/// Rejects when there is no session, the last refresh failed, or the access
/// token is still expired.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(session): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {:?}", session.account_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) if session.is_authorized(Utc::now()) => Ok(CurrentUser(session.clone())),
            _ => Err(AppError::Unauthorized),
        }
    }
}

/// Optional current user extractor
///
/// Returns the session as resolved, including errored ones, and never
/// rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Session>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer from-header"));
        headers.insert("Cookie", HeaderValue::from_static("session=from-cookie"));
        assert_eq!(
            extract_token_from_headers(&headers).as_deref(),
            Some("from-header")
        );

        headers.remove("Authorization");
        assert_eq!(
            extract_token_from_headers(&headers).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn session_cookie_attributes() {
        let rendered = session_cookie("abc.def".to_string(), true).to_string();
        assert!(rendered.starts_with("session=abc.def"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Path=/"));

        let local = session_cookie("abc.def".to_string(), false).to_string();
        assert!(!local.contains("Secure"));
    }
}
