//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate PSN calls, the metadata API and the database.

pub mod game_info;
pub mod profile;
pub mod trophy;

pub use game_info::GameInfoService;
pub use profile::{Dashboard, ProfileSummary, TitleCard, load_dashboard};
pub use trophy::{Rarity, TrophySummary, TrophyView, merge_trophy_lists, summarize};
