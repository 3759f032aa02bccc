//! SQLite-backed implementation of [`GameRepository`].

use sqlx::SqlitePool;

use super::helpers::{encode_bool, encode_hash};
use crate::ingest::IndexedGame;
use crate::persistence::traits::GameRepository;
use crate::persistence::PersistenceError;

pub struct SqliteGameRepository {
    pool: SqlitePool,
}

impl SqliteGameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl GameRepository for SqliteGameRepository {
    async fn save_game(&self, game: &IndexedGame) -> Result<(), PersistenceError> {
        let record = &game.record;
        let mut tx = self.pool.begin().await?;

        // Replacing a game also replaces its positions via ON DELETE CASCADE.
        sqlx::query("DELETE FROM games WHERE game_id = ?")
            .bind(&record.game_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO games \
             (game_id, player_id, player_color, result, rated, time_class, \
              white_rating, black_rating, normalized_white_rating, normalized_black_rating, \
              ply_count, played_at, start_fen, moves) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.game_id)
        .bind(record.player_id)
        .bind(record.player_color.as_str())
        .bind(record.result.as_str())
        .bind(encode_bool(record.rated))
        .bind(record.time_class.as_str())
        .bind(i64::from(record.white_rating))
        .bind(i64::from(record.black_rating))
        .bind(i64::from(game.normalized_white_rating()))
        .bind(i64::from(game.normalized_black_rating()))
        .bind(i64::from(game.ply_count))
        .bind(record.played_at)
        .bind(&record.start_fen)
        .bind(&record.moves)
        .execute(&mut *tx)
        .await?;

        for position in &game.positions {
            sqlx::query(
                "INSERT INTO game_positions \
                 (game_id, ply, player_id, color, position_hash, normalized_fen, san) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.game_id)
            .bind(i64::from(position.ply))
            .bind(record.player_id)
            .bind(record.player_color.as_str())
            .bind(encode_hash(position.key.hash))
            .bind(&position.key.normalized_fen)
            .bind(&position.san)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_game(&self, game_id: &str) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM games WHERE game_id = ?")
            .bind(game_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_games(&self) -> Result<u64, PersistenceError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
