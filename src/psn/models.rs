//! PSN wire types
//!
//! Field names follow the PSN JSON payloads. Everything the upstream may
//! omit is optional so a partial payload still decodes.

use serde::{Deserialize, Serialize};

// =============================================================================
// Authentication
// =============================================================================

/// Token endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub id_token: Option<String>,
    pub refresh_token: String,
    /// Refresh token lifetime in seconds
    pub refresh_token_expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

// =============================================================================
// Trophies
// =============================================================================

/// Trophy rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrophyType {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Per-rank trophy counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrophyCounts {
    #[serde(default)]
    pub bronze: u32,
    #[serde(default)]
    pub silver: u32,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub platinum: u32,
}

impl TrophyCounts {
    pub fn total(&self) -> u32 {
        self.bronze + self.silver + self.gold + self.platinum
    }

    pub fn increment(&mut self, trophy_type: TrophyType) {
        match trophy_type {
            TrophyType::Bronze => self.bronze += 1,
            TrophyType::Silver => self.silver += 1,
            TrophyType::Gold => self.gold += 1,
            TrophyType::Platinum => self.platinum += 1,
        }
    }
}

/// Trophy generation of a title ("trophy" for PS3/PS4/Vita, "trophy2" for PS5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpServiceName {
    Trophy,
    Trophy2,
}

impl NpServiceName {
    pub fn for_ps5(is_ps5: bool) -> Self {
        if is_ps5 { Self::Trophy2 } else { Self::Trophy }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trophy => "trophy",
            Self::Trophy2 => "trophy2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrophyProfileSummary {
    pub account_id: String,
    pub trophy_level: u32,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub tier: u32,
    #[serde(default)]
    pub earned_trophies: TrophyCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrophyTitle {
    pub np_service_name: String,
    pub np_communication_id: String,
    #[serde(default)]
    pub trophy_set_version: Option<String>,
    pub trophy_title_name: String,
    #[serde(default)]
    pub trophy_title_detail: Option<String>,
    pub trophy_title_icon_url: String,
    /// Comma separated, e.g. "PS4,PS5"
    pub trophy_title_platform: String,
    #[serde(default)]
    pub has_trophy_groups: bool,
    #[serde(default)]
    pub defined_trophies: TrophyCounts,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub earned_trophies: TrophyCounts,
    #[serde(default)]
    pub hidden_flag: bool,
    #[serde(default)]
    pub last_updated_date_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTitlesResponse {
    #[serde(default)]
    pub trophy_titles: Vec<TrophyTitle>,
    #[serde(default)]
    pub total_item_count: u32,
    #[serde(default)]
    pub next_offset: Option<u32>,
    #[serde(default)]
    pub previous_offset: Option<u32>,
}

/// A trophy as returned by either the title list or the earned list
///
/// The title list carries the descriptive fields, the earned list carries
/// earned state and rarity. Both share `trophy_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trophy {
    pub trophy_id: u32,
    #[serde(default)]
    pub trophy_hidden: Option<bool>,
    #[serde(default)]
    pub trophy_type: Option<TrophyType>,
    #[serde(default)]
    pub trophy_name: Option<String>,
    #[serde(default)]
    pub trophy_detail: Option<String>,
    #[serde(default)]
    pub trophy_icon_url: Option<String>,
    #[serde(default)]
    pub trophy_group_id: Option<String>,
    #[serde(default)]
    pub earned: Option<bool>,
    #[serde(default)]
    pub earned_date_time: Option<String>,
    #[serde(default)]
    pub trophy_rare: Option<u8>,
    #[serde(default)]
    pub trophy_earned_rate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrophiesResponse {
    #[serde(default)]
    pub trophy_set_version: Option<String>,
    #[serde(default)]
    pub has_trophy_groups: Option<bool>,
    #[serde(default)]
    pub trophies: Vec<Trophy>,
    #[serde(default)]
    pub total_item_count: Option<u32>,
}

// =============================================================================
// Profiles
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub size: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub online_id: String,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub avatars: Vec<Avatar>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub is_plus: bool,
    #[serde(default)]
    pub is_officially_verified: bool,
    #[serde(default)]
    pub is_me: bool,
}

impl Profile {
    /// Preferred avatar: the third size when present, else the largest listed
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatars
            .get(2)
            .or_else(|| self.avatars.last())
            .map(|avatar| avatar.url.as_str())
    }
}

// =============================================================================
// Search
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalSearchResponse {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub domain_responses: Vec<DomainResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainResponse {
    pub domain: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub social_metadata: Option<SocialMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMetadata {
    pub account_id: String,
    pub online_id: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_ps_plus: Option<bool>,
    #[serde(default)]
    pub is_officially_verified: Option<bool>,
}

/// Search domain for player accounts
pub const SEARCH_DOMAIN_ACCOUNTS: &str = "SocialAllAccounts";
