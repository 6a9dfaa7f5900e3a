//! Trophy reconciliation
//!
//! Combines the title's trophy definitions with the account's earned state
//! and tallies earned trophies by rank.

use serde::{Deserialize, Serialize};

use crate::psn::{Trophy, TrophyCounts, TrophyType};

/// Rarity tier
///
/// Ordinals follow the PSN `trophyRare` code: 0 is the rarest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    #[serde(rename = "Ultra Rare")]
    UltraRare,
    #[serde(rename = "Very Rare")]
    VeryRare,
    #[serde(rename = "Rare")]
    Rare,
    #[serde(rename = "Common")]
    Common,
}

impl Rarity {
    /// Map a `trophyRare` code; a missing code counts as 0
    pub fn from_code(code: Option<u8>) -> Self {
        match code.unwrap_or(0) {
            0 => Self::UltraRare,
            1 => Self::VeryRare,
            2 => Self::Rare,
            _ => Self::Common,
        }
    }
}

/// One trophy with its definition and the account's earned state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrophyView {
    pub id: u32,
    pub name: String,
    pub detail: String,
    pub icon_url: String,
    #[serde(rename = "type")]
    pub trophy_type: Option<TrophyType>,
    pub rarity: Rarity,
    pub is_earned: bool,
    /// Empty when not earned
    pub earned_on: String,
    /// Share of all players who earned it, in percent
    pub earned_rate: f64,
    pub hidden: bool,
    pub group_id: Option<String>,
}

/// Earned tallies for one title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrophySummary {
    /// Number of trophies in the earned list
    pub total: usize,
    /// Number of those the account has earned
    pub earned: usize,
    pub earned_by_type: TrophyCounts,
}

/// Merge the title list into the earned list
///
/// Produces one record per earned-list entry, in earned-list order. Each is
/// joined to the first title entry with the same id. Entries with no title
/// counterpart are kept with whatever the earned record carries.
pub fn merge_trophy_lists(title_trophies: &[Trophy], user_trophies: &[Trophy]) -> Vec<TrophyView> {
    user_trophies
        .iter()
        .map(|user_trophy| {
            let title_trophy = title_trophies
                .iter()
                .find(|t| t.trophy_id == user_trophy.trophy_id);
            reconcile(title_trophy, user_trophy)
        })
        .collect()
}

/// Field-by-field merge of one trophy
///
/// Earned state always comes from `user`. Descriptive fields come from
/// `title` when it has them, else from `user`.
pub fn reconcile(title: Option<&Trophy>, user: &Trophy) -> TrophyView {
    fn prefer<T>(title: Option<&Trophy>, user: &Trophy, field: impl Fn(&Trophy) -> Option<T>) -> Option<T> {
        title.and_then(&field).or_else(|| field(user))
    }

    let is_earned = user.earned.unwrap_or(false);
    let earned_on = if is_earned {
        user.earned_date_time.clone().unwrap_or_default()
    } else {
        String::new()
    };

    TrophyView {
        id: user.trophy_id,
        name: prefer(title, user, |t| t.trophy_name.clone()).unwrap_or_default(),
        detail: prefer(title, user, |t| t.trophy_detail.clone()).unwrap_or_default(),
        icon_url: prefer(title, user, |t| t.trophy_icon_url.clone()).unwrap_or_default(),
        trophy_type: prefer(title, user, |t| t.trophy_type),
        rarity: Rarity::from_code(prefer(title, user, |t| t.trophy_rare)),
        is_earned,
        earned_on,
        earned_rate: prefer(title, user, |t| t.trophy_earned_rate.clone())
            .and_then(|rate| rate.trim().parse::<f64>().ok())
            .unwrap_or(0.0),
        hidden: prefer(title, user, |t| t.trophy_hidden).unwrap_or(false),
        group_id: prefer(title, user, |t| t.trophy_group_id.clone()),
    }
}

/// Tally the earned list
pub fn summarize(user_trophies: &[Trophy]) -> TrophySummary {
    let mut summary = TrophySummary {
        total: user_trophies.len(),
        ..TrophySummary::default()
    };

    for trophy in user_trophies.iter().filter(|t| t.earned.unwrap_or(false)) {
        summary.earned += 1;
        if let Some(trophy_type) = trophy.trophy_type {
            summary.earned_by_type.increment(trophy_type);
        }
    }

    summary
}
