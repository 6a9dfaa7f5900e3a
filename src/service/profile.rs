//! Profile and dashboard service
//!
//! Builds the signed-in (or looked-up) account's overview: trophy level,
//! per-rank totals and the list of PS4/PS5 titles played.

use serde::Serialize;

use crate::data::Platform;
use crate::error::AppError;
use crate::psn::{Profile, PsnApi, TrophyCounts, TrophyProfileSummary, TrophyTitle};

/// Tier shown next to a trophy level
///
/// Levels 1-99 are tier 1, each further hundred adds one, 800-998 is tier 9
/// and 999 is tier 10. Level 0 is treated as tier 1.
pub fn tier_for_level(level: u32) -> u32 {
    match level {
        0..=99 => 1,
        100..=799 => level / 100 + 1,
        800..=998 => 9,
        _ => 10,
    }
}

/// PS4/PS5 entries of a comma separated platform list
pub fn supported_platforms(platform_list: &str) -> Vec<Platform> {
    platform_list
        .split(',')
        .filter_map(|name| Platform::parse(name.trim()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub account_id: String,
    pub online_id: String,
    pub avatar_url: Option<String>,
    pub is_plus: bool,
    pub trophy_level: u32,
    pub tier: u32,
    pub progress: u32,
    pub earned_trophies: TrophyCounts,
    pub total_trophies: u32,
}

impl ProfileSummary {
    pub fn new(summary: &TrophyProfileSummary, profile: &Profile) -> Self {
        Self {
            account_id: summary.account_id.clone(),
            online_id: profile.online_id.clone(),
            avatar_url: profile.avatar_url().map(ToOwned::to_owned),
            is_plus: profile.is_plus,
            trophy_level: summary.trophy_level,
            tier: tier_for_level(summary.trophy_level),
            progress: summary.progress,
            earned_trophies: summary.earned_trophies,
            total_trophies: summary.earned_trophies.total(),
        }
    }
}

/// One played title on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleCard {
    pub np_communication_id: String,
    pub name: String,
    pub icon_url: String,
    pub platforms: Vec<Platform>,
    /// Whether the title uses the PS5 trophy service
    #[serde(rename = "isPS5")]
    pub is_ps5: bool,
    pub progress: u32,
    pub trophies: TrophyCounts,
    pub earned_trophies: TrophyCounts,
    pub total_trophies: u32,
    pub last_updated: Option<String>,
}

impl TitleCard {
    /// `None` when the title has no PS4/PS5 platform
    pub fn from_title(title: &TrophyTitle) -> Option<Self> {
        let platforms = supported_platforms(&title.trophy_title_platform);
        if platforms.is_empty() {
            return None;
        }

        Some(Self {
            np_communication_id: title.np_communication_id.clone(),
            name: title.trophy_title_name.clone(),
            icon_url: title.trophy_title_icon_url.clone(),
            platforms,
            is_ps5: title.np_service_name == "trophy2",
            progress: title.progress,
            trophies: title.defined_trophies,
            earned_trophies: title.earned_trophies,
            total_trophies: title.defined_trophies.total(),
            last_updated: title.last_updated_date_time.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub profile: ProfileSummary,
    pub games: Vec<TitleCard>,
}

/// Load the dashboard for `account_id` ("me" for the caller)
pub async fn load_dashboard(
    psn: &dyn PsnApi,
    access_token: &str,
    account_id: &str,
) -> Result<Dashboard, AppError> {
    let (summary, titles) = tokio::try_join!(
        async {
            psn.trophy_summary(access_token, account_id)
                .await
                .map_err(AppError::from)
        },
        fetch_all_titles(psn, access_token, account_id),
    )?;

    let profile = psn.profile(access_token, &summary.account_id).await?;

    let games: Vec<TitleCard> = titles.iter().filter_map(TitleCard::from_title).collect();
    tracing::debug!(
        account_id = %summary.account_id,
        titles = titles.len(),
        shown = games.len(),
        "Dashboard loaded"
    );

    Ok(Dashboard {
        profile: ProfileSummary::new(&summary, &profile),
        games,
    })
}

/// Follow `nextOffset` until the title list is exhausted
async fn fetch_all_titles(
    psn: &dyn PsnApi,
    access_token: &str,
    account_id: &str,
) -> Result<Vec<TrophyTitle>, AppError> {
    let mut titles = Vec::new();
    let mut offset = 0;

    loop {
        let page = psn.user_titles(access_token, account_id, offset).await?;
        titles.extend(page.trophy_titles);

        match page.next_offset {
            Some(next) if next > offset => offset = next,
            _ => break,
        }
    }

    Ok(titles)
}
