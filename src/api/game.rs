//! Game page endpoint

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use super::dto::{GameProfile, GameResponse, is_np_communication_id, parse_flag, resolve_account_id};
use crate::psn::NpServiceName;
use crate::service::{merge_trophy_lists, summarize};
use crate::{AppState, auth::CurrentUser, error::AppError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameParams {
    np_communication_id: Option<String>,
    /// Trophy title name as listed on the dashboard
    name: Option<String>,
    #[serde(rename = "isPS5")]
    is_ps5: Option<String>,
    /// Numeric PSN account id; the caller when absent
    account_id: Option<String>,
}

/// GET /api/game - Merged trophy list, tallies and cached game metadata
///
/// The four upstream lookups run concurrently; the first failure aborts the
/// request.
pub async fn get_game(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(params): Query<GameParams>,
) -> Result<Json<GameResponse>, AppError> {
    let np_communication_id = params
        .np_communication_id
        .as_deref()
        .map(str::trim)
        .filter(|id| is_np_communication_id(id))
        .ok_or_else(|| {
            AppError::Validation("npCommunicationId must look like NPWR12345_00".to_string())
        })?
        .to_string();
    let name = params
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Validation("name is required".to_string()))?
        .to_string();
    let service = NpServiceName::for_ps5(parse_flag("isPS5", params.is_ps5.as_deref())?);
    let account_id = resolve_account_id(params.account_id.as_deref())?;

    let token = session.access_token();
    let (title_trophies, user_trophies, game, (profile_account_id, profile)) = tokio::try_join!(
        async {
            state
                .psn
                .title_trophies(token, &np_communication_id, service)
                .await
                .map_err(AppError::from)
        },
        async {
            state
                .psn
                .user_earned_trophies(token, &account_id, &np_communication_id, service)
                .await
                .map_err(AppError::from)
        },
        state.game_info.resolve(&np_communication_id, &name),
        async {
            // The profile endpoint needs a numeric id
            let profile_account_id = match (account_id.as_str(), &session.account_id) {
                ("me", Some(own_id)) => own_id.clone(),
                ("me", None) => state.psn.trophy_summary(token, "me").await?.account_id,
                (id, _) => id.to_string(),
            };
            let profile = state.psn.profile(token, &profile_account_id).await?;
            Ok::<_, AppError>((profile_account_id, profile))
        },
    )?;

    let trophies = merge_trophy_lists(&title_trophies.trophies, &user_trophies.trophies);
    let summary = summarize(&user_trophies.trophies);

    tracing::debug!(
        np_communication_id = %np_communication_id,
        trophies = trophies.len(),
        earned = summary.earned,
        "Game page assembled"
    );

    Ok(Json(GameResponse {
        trophies,
        summary,
        game,
        profile: GameProfile::new(&profile_account_id, &profile),
    }))
}
