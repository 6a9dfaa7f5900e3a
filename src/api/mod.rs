//! API layer
//!
//! HTTP handlers for:
//! - User dashboard
//! - Game page
//! - Account search
//! - Metrics (Prometheus)

mod dto;
mod game;
pub mod metrics;
mod search;
mod user;

pub use dto::*;
pub use metrics::metrics_router;

use axum::{Router, routing::get};

use crate::AppState;

/// Create the `/api` router
///
/// Every route requires an authenticated session.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/user", get(user::get_user))
        .route("/dashboard", get(user::get_user))
        .route("/game", get(game::get_game))
        .route("/search", get(search::search_accounts))
}
