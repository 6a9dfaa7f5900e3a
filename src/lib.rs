//! Trophy Case - a PlayStation Network trophy viewer backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - NPSSO sign-in and session endpoints                      │
//! │  - Dashboard, game and search queries                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Trophy reconciliation                                    │
//! │  - Game metadata read-through cache                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │   Data Layer (sqlx SQLite)   │ │  PSN / metadata clients    │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for the query endpoints
//! - `auth`: NPSSO sign-in, signed session cookies, token refresh
//! - `service`: Business logic layer
//! - `psn`: PlayStation Network client
//! - `metadata`: Third-party game metadata client
//! - `data`: Game metadata persistence
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod psn;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like database pool and upstream clients.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// PlayStation Network client
    pub psn: Arc<dyn psn::PsnApi>,

    /// Game metadata cache
    pub game_info: Arc<service::GameInfoService>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Build the shared HTTP client
    /// 3. Create the PSN and metadata clients
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Database connected");

        // 2. Initialize HTTP client
        // Redirects stay visible: the NPSSO exchange reads the code from Location
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("TrophyCase/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.upstream.timeout_seconds))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        // 3. Upstream clients
        let psn: Arc<dyn psn::PsnApi> = Arc::new(psn::HttpPsnClient::new(
            http_client.clone(),
            &config.psn.auth_base_url,
            &config.psn.api_base_url,
        )?);
        let metadata: Arc<dyn metadata::MetadataApi> = Arc::new(metadata::HttpMetadataClient::new(
            http_client,
            config.metadata.base_url.clone(),
            config.metadata.api_key.clone(),
        ));

        Ok(Self::from_parts(config, db, psn, metadata))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: config::AppConfig,
        db: Arc<data::Database>,
        psn: Arc<dyn psn::PsnApi>,
        metadata: Arc<dyn metadata::MetadataApi>,
    ) -> Self {
        let game_info = Arc::new(service::GameInfoService::new(db.clone(), metadata));

        tracing::info!("Application state initialized successfully");

        Self {
            config: Arc::new(config),
            db,
            psn,
            game_info,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .nest("/api", api::api_router())
        .merge(api::metrics_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_session,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method, header};
    use tower_http::cors::CorsLayer;

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    // Credentialed CORS cannot use wildcards
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => base.allow_origin([origin]).allow_credentials(true),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            base
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
