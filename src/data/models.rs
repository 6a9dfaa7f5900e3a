//! Data models
//!
//! Rust structs representing database entities.
//! Game IDs are ULIDs and timestamps use chrono.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Reference enumerations
// =============================================================================

/// Game genre
///
/// The declaration order is the order of the seeded `genres` table and the
/// order genres are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    #[serde(rename = "RPG")]
    Rpg,
    Action,
    Adventure,
    #[serde(rename = "TPS")]
    Tps,
    #[serde(rename = "FPS")]
    Fps,
    #[serde(rename = "MMO")]
    Mmo,
    Platformer,
    Fighting,
    Simulation,
    Arcade,
    Strategy,
    Sports,
    Puzzle,
    Music,
    Racing,
    Horror,
    IntStory,
}

impl Genre {
    pub const ALL: [Genre; 17] = [
        Genre::Rpg,
        Genre::Action,
        Genre::Adventure,
        Genre::Tps,
        Genre::Fps,
        Genre::Mmo,
        Genre::Platformer,
        Genre::Fighting,
        Genre::Simulation,
        Genre::Arcade,
        Genre::Strategy,
        Genre::Sports,
        Genre::Puzzle,
        Genre::Music,
        Genre::Racing,
        Genre::Horror,
        Genre::IntStory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rpg => "RPG",
            Self::Action => "Action",
            Self::Adventure => "Adventure",
            Self::Tps => "TPS",
            Self::Fps => "FPS",
            Self::Mmo => "MMO",
            Self::Platformer => "Platformer",
            Self::Fighting => "Fighting",
            Self::Simulation => "Simulation",
            Self::Arcade => "Arcade",
            Self::Strategy => "Strategy",
            Self::Sports => "Sports",
            Self::Puzzle => "Puzzle",
            Self::Music => "Music",
            Self::Racing => "Racing",
            Self::Horror => "Horror",
            Self::IntStory => "IntStory",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|genre| genre.as_str() == name)
    }
}

/// Console platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "PS4")]
    Ps4,
    #[serde(rename = "PS5")]
    Ps5,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Ps4, Platform::Ps5];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ps4 => "PS4",
            Self::Ps5 => "PS5",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|platform| platform.as_str() == name)
    }
}

// =============================================================================
// Game
// =============================================================================

/// Row of the `games` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameRow {
    pub id: String,
    pub np_communication_id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub cover_url: Option<String>,
    pub publisher: Option<String>,
    pub developer: Option<String>,
    pub ps4_store_url: Option<String>,
    pub ps5_store_url: Option<String>,
    pub content_rating: Option<String>,
    pub ps4_size: Option<i64>,
    pub ps5_size: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Cached game metadata with its screenshots, genres and platforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub np_communication_id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub cover_url: Option<String>,
    /// Ordered as delivered by the metadata API
    pub screenshots: Vec<String>,
    pub genres: Vec<Genre>,
    pub platforms: Vec<Platform>,
    pub publisher: Option<String>,
    pub developer: Option<String>,
    pub ps4_store_url: Option<String>,
    pub ps5_store_url: Option<String>,
    pub content_rating: Option<String>,
    /// Install size in bytes
    pub ps4_size: Option<i64>,
    /// Install size in bytes
    pub ps5_size: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn from_parts(
        row: GameRow,
        screenshots: Vec<String>,
        genres: Vec<Genre>,
        platforms: Vec<Platform>,
    ) -> Self {
        Self {
            id: row.id,
            np_communication_id: row.np_communication_id,
            name: row.name,
            description: row.description,
            icon_url: row.icon_url,
            cover_url: row.cover_url,
            screenshots,
            genres,
            platforms,
            publisher: row.publisher,
            developer: row.developer,
            ps4_store_url: row.ps4_store_url,
            ps5_store_url: row.ps5_store_url,
            content_rating: row.content_rating,
            ps4_size: row.ps4_size,
            ps5_size: row.ps5_size,
            created_at: row.created_at,
        }
    }
}

/// A game ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub np_communication_id: String,
    /// Display name
    pub name: String,
    /// Sanitized title name used for cache lookups
    pub lookup_name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub cover_url: Option<String>,
    pub screenshots: Vec<String>,
    pub genres: Vec<Genre>,
    pub platforms: Vec<Platform>,
    pub publisher: Option<String>,
    pub developer: Option<String>,
    pub ps4_store_url: Option<String>,
    pub ps5_store_url: Option<String>,
    pub content_rating: Option<String>,
    pub ps4_size: Option<i64>,
    pub ps5_size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_labels_round_trip() {
        for genre in Genre::ALL {
            assert_eq!(Genre::parse(genre.as_str()), Some(genre));
        }
        assert_eq!(Genre::parse("Roguelike"), None);
    }

    #[test]
    fn genre_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Genre::Rpg).unwrap(), "\"RPG\"");
        assert_eq!(serde_json::to_string(&Genre::IntStory).unwrap(), "\"IntStory\"");
        assert_eq!(serde_json::to_string(&Platform::Ps5).unwrap(), "\"PS5\"");
    }
}
