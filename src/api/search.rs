//! Account search endpoint

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use super::dto::{AccountSearchResult, validate_search_query};
use crate::psn::SEARCH_DOMAIN_ACCOUNTS;
use crate::{AppState, auth::CurrentUser, error::AppError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    query: Option<String>,
}

/// GET /api/search - Search PSN accounts by online id
pub async fn search_accounts(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<AccountSearchResult>>, AppError> {
    let query = validate_search_query(params.query.as_deref())?;

    let response = state
        .psn
        .search_accounts(session.access_token(), &query)
        .await?;

    let accounts: Vec<AccountSearchResult> = response
        .domain_responses
        .into_iter()
        .filter(|domain| domain.domain == SEARCH_DOMAIN_ACCOUNTS)
        .flat_map(|domain| domain.results)
        .filter_map(|result| result.social_metadata)
        .map(AccountSearchResult::from)
        .collect();

    tracing::debug!(results = accounts.len(), "Account search completed");

    Ok(Json(accounts))
}
