//! API response DTOs and input validation

use serde::Serialize;

use crate::data::Game;
use crate::error::AppError;
use crate::psn::{Profile, SocialMetadata};
use crate::service::{TrophySummary, TrophyView};

/// Longest accepted search term, after trimming
pub const MAX_SEARCH_LENGTH: usize = 64;

/// Response of `GET /api/game`
#[derive(Debug, Clone, Serialize)]
pub struct GameResponse {
    pub trophies: Vec<TrophyView>,
    pub summary: TrophySummary,
    pub game: Game,
    pub profile: GameProfile,
}

/// Owner of the trophy list shown on the game page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProfile {
    pub account_id: String,
    pub online_id: String,
    pub avatar_url: Option<String>,
    pub is_plus: bool,
}

impl GameProfile {
    pub fn new(account_id: &str, profile: &Profile) -> Self {
        Self {
            account_id: account_id.to_string(),
            online_id: profile.online_id.clone(),
            avatar_url: profile.avatar_url().map(ToOwned::to_owned),
            is_plus: profile.is_plus,
        }
    }
}

/// One account search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSearchResult {
    pub account_id: String,
    pub online_id: String,
    pub avatar_url: Option<String>,
}

impl From<SocialMetadata> for AccountSearchResult {
    fn from(metadata: SocialMetadata) -> Self {
        Self {
            account_id: metadata.account_id,
            online_id: metadata.online_id,
            avatar_url: metadata.avatar_url,
        }
    }
}

/// `NPWR` followed by five digits, an underscore and two digits
pub fn is_np_communication_id(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 12
        && value.starts_with("NPWR")
        && bytes[4..9].iter().all(u8::is_ascii_digit)
        && bytes[9] == b'_'
        && bytes[10..].iter().all(u8::is_ascii_digit)
}

/// Account to query: the given numeric id, or `me` when absent
pub fn resolve_account_id(account_id: Option<&str>) -> Result<String, AppError> {
    match account_id.map(str::trim).filter(|id| !id.is_empty()) {
        None => Ok("me".to_string()),
        Some(id) if id.bytes().all(|b| b.is_ascii_digit()) => Ok(id.to_string()),
        Some(_) => Err(AppError::Validation("accountId must be numeric".to_string())),
    }
}

/// Parse a query-string boolean (`true`/`false`/`1`/`0`)
pub fn parse_flag(name: &str, value: Option<&str>) -> Result<bool, AppError> {
    match value.map(str::trim) {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(_) => Err(AppError::Validation(format!("{name} must be a boolean"))),
    }
}

/// Trim and bound a search term
pub fn validate_search_query(query: Option<&str>) -> Result<String, AppError> {
    let query = query.map(str::trim).unwrap_or_default();
    let length = query.chars().count();
    if length == 0 || length > MAX_SEARCH_LENGTH {
        return Err(AppError::Validation(format!(
            "query must be between 1 and {MAX_SEARCH_LENGTH} characters"
        )));
    }
    Ok(query.to_string())
}
