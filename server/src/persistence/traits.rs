//! Async repository trait definitions for the persistence layer.
//!
//! The explorer service is generic over these traits (static dispatch), so
//! tests and alternative backends can stand in for SQLite.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` and can be driven from `tokio::spawn`.

use std::future::Future;

use chess::PositionKey;

use super::PersistenceError;
use crate::explorer::mapper::RawAggregateRow;
use crate::explorer::query::StatisticsQuery;
use crate::follow::ExplorerPositionFollower;
use crate::ingest::IndexedGame;

/// Executes built statistics queries against the analytical store.
///
/// Implementations run the statement exactly once and return the rows
/// positionally decoded; validation is the caller's job.
pub trait StatisticsStore: Send + Sync {
    fn run_statistics(
        &self,
        query: &StatisticsQuery,
    ) -> impl Future<Output = Result<Vec<RawAggregateRow>, PersistenceError>> + Send;
}

/// Write side of the game corpus.
///
/// A game and its position rows are stored atomically; saving a game id that
/// already exists replaces it.
pub trait GameRepository: Send + Sync {
    fn save_game(
        &self,
        game: &IndexedGame,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn delete_game(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn count_games(&self) -> impl Future<Output = Result<u64, PersistenceError>> + Send;
}

/// The position follow index, keyed by `(position key, follower)`.
pub trait FollowerRepository: Send + Sync {
    /// Insert or fully replace the record for `(follower.position, follower.follower)`.
    ///
    /// `updated_at` is kept when the stored policy is identical.
    fn upsert_follower(
        &self,
        follower: &ExplorerPositionFollower,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Delete the record if present. Returns whether a record existed.
    fn delete_follower(
        &self,
        position: &PositionKey,
        follower: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn load_follower(
        &self,
        position: &PositionKey,
        follower: &str,
    ) -> impl Future<Output = Result<Option<ExplorerPositionFollower>, PersistenceError>> + Send;
    /// Everyone following `position`.
    fn list_followers(
        &self,
        position: &PositionKey,
    ) -> impl Future<Output = Result<Vec<ExplorerPositionFollower>, PersistenceError>> + Send;
    /// Every position `follower` follows, most recently updated first.
    fn list_followed(
        &self,
        follower: &str,
    ) -> impl Future<Output = Result<Vec<ExplorerPositionFollower>, PersistenceError>> + Send;
}
