//! Player statistics and position follows.
//!
//! [`ExplorerService`] is the request-scoped core. Each operation canonicalizes
//! the incoming position exactly once and threads the resulting
//! [`PositionKey`] through to the store. The service holds no state of its
//! own beyond the repositories, so it can be shared freely across tasks.

pub mod mapper;
pub mod query;
pub mod request;

use chess::{canonicalize, PositionKey};

use crate::error::ExplorerError;
use crate::follow::{
    select_recipients, ExplorerPositionFollower, FollowOutcome, FollowPositionRequest,
    NewExplorerGame,
};
use crate::ingest::{index_game, GameRecord, IndexedGame};
use crate::persistence::sqlite::{
    Database, SqliteFollowerRepository, SqliteGameRepository, SqliteStatisticsStore,
};
use crate::persistence::{now_timestamp, FollowerRepository, GameRepository, StatisticsStore};

pub use mapper::MoveAggregateRow;
pub use query::build_statistics_query;
pub use request::PlayerStatisticsRequest;

/// The explorer backed by SQLite.
pub type SqliteExplorer =
    ExplorerService<SqliteStatisticsStore, SqliteGameRepository, SqliteFollowerRepository>;

pub struct ExplorerService<S, G, F> {
    statistics: S,
    games: G,
    followers: F,
}

impl SqliteExplorer {
    pub fn sqlite(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self::new(
            SqliteStatisticsStore::new(pool.clone()),
            SqliteGameRepository::new(pool.clone()),
            SqliteFollowerRepository::new(pool),
        )
    }
}

impl<S, G, F> ExplorerService<S, G, F>
where
    S: StatisticsStore,
    G: GameRepository,
    F: FollowerRepository,
{
    pub fn new(statistics: S, games: G, followers: F) -> Self {
        Self {
            statistics,
            games,
            followers,
        }
    }

    /// Per-move aggregates for one player at one position, most played first.
    pub async fn player_statistics(
        &self,
        req: &PlayerStatisticsRequest,
    ) -> Result<Vec<MoveAggregateRow>, ExplorerError> {
        req.validate()?;
        let key = canonicalize(&req.position)?;
        let query = build_statistics_query(req, &key);

        tracing::debug!(sql = %query.sql, params = query.params.len(), "Running statistics query");
        let raw = self.statistics.run_statistics(&query).await?;
        let rows = mapper::map_rows(raw)?;

        tracing::info!(
            player_id = req.player_id,
            color = %req.color,
            position = %key.hash_hex(),
            moves = rows.len(),
            "Player statistics"
        );
        Ok(rows)
    }

    /// Follow (upsert the full policy) or unfollow (delete if present).
    pub async fn follow_position(
        &self,
        follower: &str,
        req: FollowPositionRequest,
    ) -> Result<FollowOutcome, ExplorerError> {
        let follower = follower.trim();
        if follower.is_empty() {
            return Err(ExplorerError::InvalidFollower(
                "follower id is empty".to_string(),
            ));
        }
        let key = canonicalize(req.fen())?;

        match req {
            FollowPositionRequest::Follow { policy, .. } => {
                policy.validate()?;
                let record = ExplorerPositionFollower {
                    follower: follower.to_string(),
                    position: key,
                    policy,
                    updated_at: now_timestamp(),
                };
                self.followers.upsert_follower(&record).await?;
                // Re-read: an unchanged policy keeps its earlier timestamp.
                let stored = self
                    .followers
                    .load_follower(&record.position, follower)
                    .await?;
                let record = stored.unwrap_or(record);
                tracing::info!(
                    follower,
                    position = %record.position.hash_hex(),
                    dojo = record.policy.dojo.enabled,
                    masters = record.policy.masters.enabled,
                    "Followed position"
                );
                Ok(FollowOutcome::Followed(record))
            }
            FollowPositionRequest::Unfollow { .. } => {
                let existed = self.followers.delete_follower(&key, follower).await?;
                tracing::info!(
                    follower,
                    position = %key.hash_hex(),
                    existed,
                    "Unfollowed position"
                );
                Ok(FollowOutcome::Unfollowed {
                    position: key,
                    existed,
                })
            }
        }
    }

    /// Everyone following the position given as a FEN.
    pub async fn followers(
        &self,
        fen: &str,
    ) -> Result<Vec<ExplorerPositionFollower>, ExplorerError> {
        let key = canonicalize(fen)?;
        self.followers_by_key(&key).await
    }

    pub async fn followers_by_key(
        &self,
        key: &PositionKey,
    ) -> Result<Vec<ExplorerPositionFollower>, ExplorerError> {
        let followers = self.followers.list_followers(key).await?;
        tracing::debug!(position = %key.hash_hex(), count = followers.len(), "Listed followers");
        Ok(followers)
    }

    /// Positions `follower` follows, most recently updated first.
    pub async fn followed_positions(
        &self,
        follower: &str,
    ) -> Result<Vec<ExplorerPositionFollower>, ExplorerError> {
        let follower = follower.trim();
        if follower.is_empty() {
            return Err(ExplorerError::InvalidFollower(
                "follower id is empty".to_string(),
            ));
        }
        Ok(self.followers.list_followed(follower).await?)
    }

    /// Followers of `fen` whose policy accepts `game`.
    pub async fn notification_recipients(
        &self,
        fen: &str,
        game: &NewExplorerGame,
    ) -> Result<Vec<ExplorerPositionFollower>, ExplorerError> {
        let key = canonicalize(fen)?;
        let followers = self.followers.list_followers(&key).await?;
        let recipients: Vec<ExplorerPositionFollower> = select_recipients(&followers, game)
            .into_iter()
            .cloned()
            .collect();

        tracing::info!(
            position = %key.hash_hex(),
            followers = followers.len(),
            recipients = recipients.len(),
            "Selected notification recipients"
        );
        Ok(recipients)
    }

    /// Replay a finished game and store its position rows.
    pub async fn ingest_game(&self, record: GameRecord) -> Result<IndexedGame, ExplorerError> {
        let game = index_game(record)?;
        self.games.save_game(&game).await?;
        tracing::info!(
            game_id = %game.record.game_id,
            player_id = game.record.player_id,
            plies = game.ply_count,
            positions = game.positions.len(),
            "Ingested game"
        );
        Ok(game)
    }

    pub async fn remove_game(&self, game_id: &str) -> Result<bool, ExplorerError> {
        let existed = self.games.delete_game(game_id).await?;
        tracing::info!(game_id, existed, "Removed game");
        Ok(existed)
    }

    pub async fn game_count(&self) -> Result<u64, ExplorerError> {
        Ok(self.games.count_games().await?)
    }
}
