//! Game metadata service
//!
//! Read-through cache in front of the metadata API. A game is fetched once,
//! stored, and served from SQLite from then on.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::data::{Database, Game, Genre, NewGame, Platform};
use crate::error::AppError;
use crate::metadata::{MetadataApi, MetadataResponse, is_truthy, parse_size};
use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};

const CACHE_NAME: &str = "game_info";

/// Strip trademark marks and the "Trophies" suffix PSN appends to titles
pub fn sanitize_name(raw: &str) -> String {
    raw.replace(['™', '®'], "")
        .replace("Trophies", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a storable game from a successful metadata response
pub fn transform(
    np_communication_id: &str,
    sanitized_name: &str,
    response: &MetadataResponse,
) -> NewGame {
    let name = response
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(sanitized_name)
        .to_string();

    let genres = Genre::ALL
        .into_iter()
        .filter(|genre| response.has_genre_flag(genre.as_str()))
        .collect();

    let mut platforms = Vec::new();
    if is_truthy(&response.ps4) {
        platforms.push(Platform::Ps4);
    }
    if is_truthy(&response.ps5) {
        platforms.push(Platform::Ps5);
    }

    NewGame {
        np_communication_id: np_communication_id.to_string(),
        name,
        lookup_name: sanitized_name.to_string(),
        description: response.description.as_deref().map(ammonia::clean),
        icon_url: non_empty(&response.icon),
        cover_url: non_empty(&response.cover),
        screenshots: response.screenshots(),
        genres,
        platforms,
        publisher: non_empty(&response.publisher),
        developer: non_empty(&response.developer),
        ps4_store_url: non_empty(&response.ps4_store_url),
        ps5_store_url: non_empty(&response.ps5_store_url),
        content_rating: non_empty(&response.content_rating),
        ps4_size: parse_size(&response.ps4_size),
        ps5_size: parse_size(&response.ps5_size),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Game metadata service
pub struct GameInfoService {
    db: Arc<Database>,
    metadata: Arc<dyn MetadataApi>,
    /// One lock per communication id, held across lookup, fetch and insert
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GameInfoService {
    pub fn new(db: Arc<Database>, metadata: Arc<dyn MetadataApi>) -> Self {
        Self {
            db,
            metadata,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached game, fetching and storing it on first lookup
    ///
    /// # Errors
    /// `AppError::Metadata` when the upstream reports an error; nothing is
    /// stored in that case.
    pub async fn resolve(&self, np_communication_id: &str, raw_name: &str) -> Result<Game, AppError> {
        let name = sanitize_name(raw_name);

        let key_lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(np_communication_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result = {
            let _guard = key_lock.lock().await;
            self.lookup_or_fetch(np_communication_id, &name).await
        };

        drop(key_lock);
        self.release_lock(np_communication_id).await;

        result
    }

    async fn lookup_or_fetch(&self, np_communication_id: &str, name: &str) -> Result<Game, AppError> {
        if let Some(game) = self.db.find_game(np_communication_id, name).await? {
            CACHE_HITS_TOTAL.with_label_values(&[CACHE_NAME]).inc();
            tracing::debug!(np_communication_id = %np_communication_id, "Game info cache hit");
            return Ok(game);
        }

        CACHE_MISSES_TOTAL.with_label_values(&[CACHE_NAME]).inc();
        tracing::info!(
            np_communication_id = %np_communication_id,
            name = %name,
            "Game info cache miss, fetching metadata"
        );

        let response = self.metadata.fetch(name).await?;
        if response.error != 0 {
            let description = response
                .error_desc
                .unwrap_or_else(|| format!("metadata lookup failed with code {}", response.error));
            tracing::warn!(
                np_communication_id = %np_communication_id,
                code = response.error,
                "Metadata API returned an error"
            );
            return Err(AppError::Metadata(description));
        }

        let new_game = transform(np_communication_id, name, &response);
        self.db.insert_game(&new_game).await
    }

    /// Drop the lock entry once nobody else is waiting on it
    async fn release_lock(&self, np_communication_id: &str) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(np_communication_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(np_communication_id);
        }
    }
}
