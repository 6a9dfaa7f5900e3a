//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Games
    // =========================================================================

    /// Find a cached game by communication id OR the sanitized name it was
    /// looked up under
    ///
    /// The oldest matching row wins.
    pub async fn find_game(
        &self,
        np_communication_id: &str,
        name: &str,
    ) -> Result<Option<Game>, AppError> {
        let row = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT * FROM games
            WHERE np_communication_id = ? OR lookup_name = ?
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(np_communication_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_game(row).await?)),
            None => Ok(None),
        }
    }

    /// Get a cached game by communication id
    pub async fn get_game_by_np_communication_id(
        &self,
        np_communication_id: &str,
    ) -> Result<Option<Game>, AppError> {
        let row =
            sqlx::query_as::<_, GameRow>("SELECT * FROM games WHERE np_communication_id = ?")
                .bind(np_communication_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.load_game(row).await?)),
            None => Ok(None),
        }
    }

    /// Insert a game with its screenshots, genres and platforms
    ///
    /// Runs in one transaction. When another writer already stored the same
    /// communication id, nothing is written and the existing row is returned.
    pub async fn insert_game(&self, game: &NewGame) -> Result<Game, AppError> {
        let id = EntityId::new().0;
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO games (
                id, np_communication_id, name, lookup_name, description, icon_url, cover_url,
                publisher, developer, ps4_store_url, ps5_store_url, content_rating,
                ps4_size, ps5_size, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(np_communication_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(&game.np_communication_id)
        .bind(&game.name)
        .bind(&game.lookup_name)
        .bind(&game.description)
        .bind(&game.icon_url)
        .bind(&game.cover_url)
        .bind(&game.publisher)
        .bind(&game.developer)
        .bind(&game.ps4_store_url)
        .bind(&game.ps5_store_url)
        .bind(&game.content_rating)
        .bind(game.ps4_size)
        .bind(game.ps5_size)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::info!(
                np_communication_id = %game.np_communication_id,
                "Game already stored by a concurrent writer"
            );
            return self
                .get_game_by_np_communication_id(&game.np_communication_id)
                .await?
                .ok_or(AppError::NotFound);
        }

        for (position, url) in game.screenshots.iter().enumerate() {
            sqlx::query("INSERT INTO screenshots (game_id, position, url) VALUES (?, ?, ?)")
                .bind(&id)
                .bind(position as i64)
                .bind(url)
                .execute(&mut *tx)
                .await?;
        }

        for genre in &game.genres {
            sqlx::query(
                "INSERT INTO game_genres (game_id, genre_id) SELECT ?, id FROM genres WHERE name = ?",
            )
            .bind(&id)
            .bind(genre.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for platform in &game.platforms {
            sqlx::query(
                "INSERT INTO game_platforms (game_id, platform_id) SELECT ?, id FROM platforms WHERE name = ?",
            )
            .bind(&id)
            .bind(platform.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            np_communication_id = %game.np_communication_id,
            name = %game.name,
            screenshots = game.screenshots.len(),
            "Game metadata stored"
        );

        self.get_game_by_np_communication_id(&game.np_communication_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Number of cached games
    pub async fn count_games(&self) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn load_game(&self, row: GameRow) -> Result<Game, AppError> {
        let screenshots: Vec<(String,)> =
            sqlx::query_as("SELECT url FROM screenshots WHERE game_id = ? ORDER BY position ASC")
                .bind(&row.id)
                .fetch_all(&self.pool)
                .await?;

        let genres: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT g.name FROM game_genres gg
            JOIN genres g ON g.id = gg.genre_id
            WHERE gg.game_id = ?
            ORDER BY g.id ASC
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let platforms: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT p.name FROM game_platforms gp
            JOIN platforms p ON p.id = gp.platform_id
            WHERE gp.game_id = ?
            ORDER BY p.id ASC
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Game::from_parts(
            row,
            screenshots.into_iter().map(|(url,)| url).collect(),
            genres
                .into_iter()
                .filter_map(|(name,)| Genre::parse(&name))
                .collect(),
            platforms
                .into_iter()
                .filter_map(|(name,)| Platform::parse(&name))
                .collect(),
        ))
    }

    /// Names of the seeded genres, in table order
    pub async fn list_genres(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM genres ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
