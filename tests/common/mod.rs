//! Common test utilities for E2E tests
//!
//! `TestServer` runs the real router on a random port. Its PSN and metadata
//! base URLs point at `FakeUpstream`, a small axum server that mimics the
//! upstream endpoints with canned data.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use trophy_case::{AppState, auth::Session, config, psn::AuthTokens};

pub const VALID_NPSSO: &str = "valid-npsso";
pub const AUTH_CODE: &str = "v3.abc123";
pub const FIRST_ACCESS_TOKEN: &str = "access-1";
pub const REFRESHED_ACCESS_TOKEN: &str = "access-2";
pub const GOOD_REFRESH_TOKEN: &str = "refresh-ok";
pub const MY_ACCOUNT_ID: &str = "6515971742264256071";
pub const OTHER_ACCOUNT_ID: &str = "1111111111111111111";
pub const PRIVATE_ACCOUNT_ID: &str = "2222222222222222222";
pub const GAME_ID: &str = "NPWR20188_00";
pub const GAME_NAME: &str = "Ratchet & Clank™: Rift Apart Trophies";
pub const UNKNOWN_GAME_NAME: &str = "Unknown Game";
pub const SESSION_SECRET: &str = "test-secret-key-32-bytes-long!!!";

// =============================================================================
// Fake upstream
// =============================================================================

/// Request counters of the fake upstream
#[derive(Default)]
pub struct UpstreamCalls {
    pub metadata: AtomicUsize,
    pub refresh: AtomicUsize,
    pub search: AtomicUsize,
}

/// PSN + metadata stand-in
pub struct FakeUpstream {
    pub base_url: String,
    pub calls: Arc<UpstreamCalls>,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let calls = Arc::new(UpstreamCalls::default());

        let app = Router::new()
            .route("/api/authz/v3/oauth/authorize", get(authorize))
            .route("/api/authz/v3/oauth/token", post(token))
            .route(
                "/api/trophy/v1/users/:account_id/trophySummary",
                get(trophy_summary),
            )
            .route(
                "/api/trophy/v1/users/:account_id/trophyTitles",
                get(trophy_titles),
            )
            .route(
                "/api/trophy/v1/users/:account_id/npCommunicationIds/:np_communication_id/trophyGroups/all/trophies",
                get(earned_trophies),
            )
            .route(
                "/api/trophy/v1/npCommunicationIds/:np_communication_id/trophyGroups/all/trophies",
                get(title_trophies),
            )
            .route(
                "/api/userProfile/v1/internal/users/:account_id/profiles",
                get(profile),
            )
            .route("/api/search/v1/universalSearch", post(universal_search))
            .route("/metadata", get(metadata))
            .with_state(calls.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            calls,
        }
    }
}

type Calls = State<Arc<UpstreamCalls>>;

fn psn_error(status: StatusCode, code: i64, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

/// `None` when the bearer token is one the fake token endpoint issued
fn reject_bad_token(headers: &HeaderMap) -> Option<Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(FIRST_ACCESS_TOKEN) | Some(REFRESHED_ACCESS_TOKEN) => None,
        _ => Some(psn_error(
            StatusCode::UNAUTHORIZED,
            2_241_025,
            "Invalid token",
        )),
    }
}

async fn authorize(headers: HeaderMap) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let location = if cookie == format!("npsso={VALID_NPSSO}") {
        format!("com.scee.psxandroid.scecompcall://redirect/?code={AUTH_CODE}&cid=test")
    } else {
        "com.scee.psxandroid.scecompcall://redirect/?error=login_required".to_string()
    };

    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn token_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3599,
        "scope": "psn:mobile.v2.core psn:clientapp",
        "id_token": "id-token",
        "refresh_token": GOOD_REFRESH_TOKEN,
        "refresh_token_expires_in": 5183999
    })
}

async fn token(State(calls): Calls, Form(form): Form<HashMap<String, String>>) -> Response {
    let grant = form.get("grant_type").map(String::as_str);
    match grant {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some(AUTH_CODE) => {
            Json(token_body(FIRST_ACCESS_TOKEN)).into_response()
        }
        Some("refresh_token") => {
            calls.refresh.fetch_add(1, Ordering::SeqCst);
            if form.get("refresh_token").map(String::as_str) == Some(GOOD_REFRESH_TOKEN) {
                Json(token_body(REFRESHED_ACCESS_TOKEN)).into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_grant",
                        "error_description": "Invalid refresh token"
                    })),
                )
                    .into_response()
            }
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })),
        )
            .into_response(),
    }
}

fn resolve_account(account_id: &str) -> &str {
    if account_id == "me" { MY_ACCOUNT_ID } else { account_id }
}

async fn trophy_summary(headers: HeaderMap, Path(account_id): Path<String>) -> Response {
    if let Some(rejection) = reject_bad_token(&headers) {
        return rejection;
    }
    if account_id == PRIVATE_ACCOUNT_ID {
        return psn_error(
            StatusCode::FORBIDDEN,
            2_240_526,
            "Not permitted by access control",
        );
    }

    Json(json!({
        "accountId": resolve_account(&account_id),
        "trophyLevel": 412,
        "progress": 36,
        "tier": 5,
        "earnedTrophies": { "bronze": 900, "silver": 250, "gold": 80, "platinum": 12 }
    }))
    .into_response()
}

fn title_entry(id: &str, name: &str, platform: &str, service: &str) -> Value {
    json!({
        "npServiceName": service,
        "npCommunicationId": id,
        "trophySetVersion": "01.00",
        "trophyTitleName": name,
        "trophyTitleIconUrl": format!("https://img.example.com/{id}.png"),
        "trophyTitlePlatform": platform,
        "hasTrophyGroups": false,
        "definedTrophies": { "bronze": 30, "silver": 8, "gold": 3, "platinum": 1 },
        "progress": 40,
        "earnedTrophies": { "bronze": 12, "silver": 3, "gold": 1, "platinum": 0 },
        "hiddenFlag": false,
        "lastUpdatedDateTime": "2021-08-15T21:22:08Z"
    })
}

async fn trophy_titles(
    headers: HeaderMap,
    Path(account_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = reject_bad_token(&headers) {
        return rejection;
    }
    if account_id == PRIVATE_ACCOUNT_ID {
        return psn_error(
            StatusCode::FORBIDDEN,
            2_240_526,
            "Not permitted by access control",
        );
    }

    let offset = query.get("offset").map(String::as_str).unwrap_or("0");
    let page = if offset == "0" {
        json!({
            "trophyTitles": [
                title_entry("NPWR10000_00", "God of War", "PS4", "trophy"),
                title_entry("NPWR05000_00", "Uncharted 2", "PS3", "trophy"),
            ],
            "totalItemCount": 3,
            "nextOffset": 2
        })
    } else {
        json!({
            "trophyTitles": [
                title_entry(GAME_ID, GAME_NAME, "PS5", "trophy2"),
            ],
            "totalItemCount": 3,
            "previousOffset": 0
        })
    };
    Json(page).into_response()
}

async fn title_trophies(headers: HeaderMap, Path(_id): Path<String>) -> Response {
    if let Some(rejection) = reject_bad_token(&headers) {
        return rejection;
    }

    Json(json!({
        "trophySetVersion": "01.00",
        "hasTrophyGroups": false,
        "trophies": [
            {
                "trophyId": 0,
                "trophyHidden": false,
                "trophyType": "platinum",
                "trophyName": "Sparkly Metal Dude",
                "trophyDetail": "Earn all trophies",
                "trophyIconUrl": "https://img.example.com/t0.png",
                "trophyGroupId": "default"
            },
            {
                "trophyId": 1,
                "trophyHidden": false,
                "trophyType": "bronze",
                "trophyName": "First Steps",
                "trophyDetail": "Finish the tutorial",
                "trophyIconUrl": "https://img.example.com/t1.png",
                "trophyGroupId": "default"
            },
            {
                "trophyId": 2,
                "trophyHidden": true,
                "trophyType": "bronze",
                "trophyName": "Secret",
                "trophyDetail": "Find the secret",
                "trophyIconUrl": "https://img.example.com/t2.png",
                "trophyGroupId": "default"
            }
        ],
        "totalItemCount": 3
    }))
    .into_response()
}

async fn earned_trophies(
    headers: HeaderMap,
    Path((account_id, _id)): Path<(String, String)>,
) -> Response {
    if let Some(rejection) = reject_bad_token(&headers) {
        return rejection;
    }
    if account_id == PRIVATE_ACCOUNT_ID {
        return psn_error(
            StatusCode::FORBIDDEN,
            2_240_526,
            "Not permitted by access control",
        );
    }

    Json(json!({
        "trophySetVersion": "01.00",
        "hasTrophyGroups": false,
        "trophies": [
            {
                "trophyId": 2,
                "trophyHidden": true,
                "trophyType": "bronze",
                "earned": true,
                "earnedDateTime": "2021-06-12T10:00:00Z",
                "trophyRare": 1,
                "trophyEarnedRate": "12.5"
            },
            {
                "trophyId": 0,
                "trophyHidden": false,
                "trophyType": "platinum",
                "earned": false,
                "trophyRare": 0,
                "trophyEarnedRate": "3.1"
            },
            {
                "trophyId": 1,
                "trophyHidden": false,
                "trophyType": "bronze",
                "earned": true,
                "earnedDateTime": "2021-06-11T09:00:00Z",
                "trophyRare": 3,
                "trophyEarnedRate": "92.0"
            }
        ],
        "totalItemCount": 3
    }))
    .into_response()
}

async fn profile(headers: HeaderMap, Path(account_id): Path<String>) -> Response {
    if let Some(rejection) = reject_bad_token(&headers) {
        return rejection;
    }

    // The internal profile endpoint has no `me` alias
    if !account_id.bytes().all(|b| b.is_ascii_digit()) {
        return psn_error(StatusCode::NOT_FOUND, 2_105_356, "User not found");
    }

    let online_id = if account_id == MY_ACCOUNT_ID {
        "kratos"
    } else {
        "atreus"
    };

    Json(json!({
        "onlineId": online_id,
        "aboutMe": "",
        "avatars": [
            { "size": "s", "url": "https://img.example.com/avatar-s.png" },
            { "size": "m", "url": "https://img.example.com/avatar-m.png" },
            { "size": "l", "url": "https://img.example.com/avatar-l.png" },
            { "size": "xl", "url": "https://img.example.com/avatar-xl.png" }
        ],
        "languages": ["en-US"],
        "isPlus": true,
        "isOfficiallyVerified": false,
        "isMe": online_id == "kratos"
    }))
    .into_response()
}

async fn universal_search(
    State(calls): Calls,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = reject_bad_token(&headers) {
        return rejection;
    }
    calls.search.fetch_add(1, Ordering::SeqCst);

    let term = body["searchTerm"].as_str().unwrap_or_default().to_string();
    Json(json!({
        "prefix": term,
        "domainResponses": [
            {
                "domain": "SocialAllAccounts",
                "results": [
                    {
                        "id": "r1",
                        "socialMetadata": {
                            "accountId": OTHER_ACCOUNT_ID,
                            "onlineId": format!("{term}_fan"),
                            "avatarUrl": "https://img.example.com/fan.png",
                            "isPsPlus": false,
                            "isOfficiallyVerified": false
                        }
                    },
                    { "id": "r2" }
                ]
            }
        ]
    }))
    .into_response()
}

async fn metadata(State(calls): Calls, Query(query): Query<HashMap<String, String>>) -> Response {
    calls.metadata.fetch_add(1, Ordering::SeqCst);

    if query.get("key").map(String::as_str) != Some("test-metadata-key") {
        return (StatusCode::FORBIDDEN, "bad key").into_response();
    }

    let name = query.get("name").cloned().unwrap_or_default();
    if name == UNKNOWN_GAME_NAME {
        return Json(json!({ "error": 3, "errorDesc": "Game not found" })).into_response();
    }

    Json(json!({
        "error": 0,
        "name": name,
        "description": "<p>Go <b>dimension-hopping</b></p><script>alert(1)</script>",
        "icon": "https://img.example.com/icon.png",
        "cover": "https://img.example.com/cover.jpg",
        "publisher": "Sony Interactive Entertainment",
        "developer": "Insomniac Games",
        "ps5StoreUrl": "https://store.example.com/rift-apart",
        "contentRating": "T",
        "ps4": 0,
        "ps5": 1,
        "ps4Size": null,
        "ps5Size": "42949672960",
        "screenshot1": "https://img.example.com/s1.jpg",
        "screenshot2": "",
        "screenshot3": "https://img.example.com/s3.jpg",
        "genreAction": 1,
        "genrePlatformer": "true",
        "genreRPG": 0
    }))
    .into_response()
}

// =============================================================================
// Test server
// =============================================================================

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub upstream: FakeUpstream,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let upstream = FakeUpstream::start().await;

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                session_secret: SESSION_SECRET.to_string(),
                session_max_age: 604800,
            },
            psn: config::PsnConfig {
                auth_base_url: upstream.base_url.clone(),
                api_base_url: upstream.base_url.clone(),
            },
            metadata: config::MetadataConfig {
                base_url: format!("{}/metadata", upstream.base_url),
                api_key: "test-metadata-key".to_string(),
            },
            upstream: config::UpstreamConfig { timeout_seconds: 5 },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = trophy_case::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            upstream,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Sign in with the valid NPSSO token and return the session token
    pub async fn sign_in(&self) -> String {
        let response = self
            .client
            .post(self.url("/auth/signin"))
            .json(&json!({ "npsso": VALID_NPSSO }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Sign a session whose access token has already expired
    pub fn expired_session_token(&self, refresh_token: &str) -> String {
        let now = chrono::Utc::now();
        let tokens = AuthTokens {
            access_token: "stale-access".to_string(),
            expires_in: 3599,
            id_token: None,
            refresh_token: refresh_token.to_string(),
            refresh_token_expires_in: 5_183_999,
            scope: None,
            token_type: Some("bearer".to_string()),
        };
        let mut session = Session::new(
            tokens,
            Some(MY_ACCOUNT_ID.to_string()),
            now - chrono::Duration::hours(2),
            604800,
        );
        session.expires_at = now - chrono::Duration::minutes(5);

        trophy_case::auth::create_session_token(&session, SESSION_SECRET).unwrap()
    }

    /// Sign a live session that never learned its account id
    pub fn session_token_without_account_id(&self) -> String {
        let tokens = AuthTokens {
            access_token: FIRST_ACCESS_TOKEN.to_string(),
            expires_in: 3599,
            id_token: None,
            refresh_token: GOOD_REFRESH_TOKEN.to_string(),
            refresh_token_expires_in: 5_183_999,
            scope: None,
            token_type: Some("bearer".to_string()),
        };
        let session = Session::new(tokens, None, chrono::Utc::now(), 604800);

        trophy_case::auth::create_session_token(&session, SESSION_SECRET).unwrap()
    }

    /// GET with a bearer session token
    pub async fn get_authed(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}
