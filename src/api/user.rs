//! User dashboard endpoint

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use super::dto::resolve_account_id;
use crate::service::{Dashboard, load_dashboard};
use crate::{AppState, auth::CurrentUser, error::AppError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserParams {
    /// Numeric PSN account id; the caller when absent
    account_id: Option<String>,
}

/// GET /api/user - Profile summary and played titles
///
/// Also served as `/api/dashboard`.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(params): Query<UserParams>,
) -> Result<Json<Dashboard>, AppError> {
    let account_id = resolve_account_id(params.account_id.as_deref())?;

    let dashboard = load_dashboard(state.psn.as_ref(), session.access_token(), &account_id).await?;

    Ok(Json(dashboard))
}
