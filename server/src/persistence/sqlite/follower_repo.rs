//! SQLite-backed implementation of [`FollowerRepository`].

use chess::PositionKey;
use sqlx::SqlitePool;

use super::helpers::{
    decode_bool, decode_hash, decode_time_controls, encode_bool, encode_hash,
    encode_time_controls,
};
use crate::follow::{DojoFollowPolicy, ExplorerPositionFollower, FollowPolicy, MastersFollowPolicy};
use crate::persistence::traits::FollowerRepository;
use crate::persistence::PersistenceError;

const SELECT_COLUMNS: &str = "SELECT position_hash, normalized_fen, follower, \
     dojo_enabled, dojo_min_cohort, dojo_max_cohort, dojo_disable_variations, \
     masters_enabled, masters_min_average_rating, masters_time_controls, updated_at \
     FROM position_followers";

#[derive(sqlx::FromRow)]
struct FollowerRow {
    position_hash: i64,
    normalized_fen: String,
    follower: String,
    dojo_enabled: i64,
    dojo_min_cohort: Option<String>,
    dojo_max_cohort: Option<String>,
    dojo_disable_variations: i64,
    masters_enabled: i64,
    masters_min_average_rating: Option<i64>,
    masters_time_controls: Option<String>,
    updated_at: i64,
}

impl TryFrom<FollowerRow> for ExplorerPositionFollower {
    type Error = PersistenceError;

    fn try_from(row: FollowerRow) -> Result<Self, Self::Error> {
        let min_average_rating = row
            .masters_min_average_rating
            .map(u32::try_from)
            .transpose()
            .map_err(|_| {
                PersistenceError::Malformed(format!(
                    "masters_min_average_rating out of range for {}",
                    row.follower
                ))
            })?;

        Ok(Self {
            position: PositionKey {
                normalized_fen: row.normalized_fen,
                hash: decode_hash(row.position_hash),
            },
            policy: FollowPolicy {
                dojo: DojoFollowPolicy {
                    enabled: decode_bool(row.dojo_enabled),
                    min_cohort: row.dojo_min_cohort,
                    max_cohort: row.dojo_max_cohort,
                    disable_variations: decode_bool(row.dojo_disable_variations),
                },
                masters: MastersFollowPolicy {
                    enabled: decode_bool(row.masters_enabled),
                    min_average_rating,
                    time_controls: decode_time_controls(row.masters_time_controls.as_deref())?,
                },
            },
            follower: row.follower,
            updated_at: row.updated_at as u64,
        })
    }
}

pub struct SqliteFollowerRepository {
    pool: SqlitePool,
}

impl SqliteFollowerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl FollowerRepository for SqliteFollowerRepository {
    async fn upsert_follower(
        &self,
        follower: &ExplorerPositionFollower,
    ) -> Result<(), PersistenceError> {
        let policy = &follower.policy;
        let time_controls = encode_time_controls(policy.masters.time_controls.as_deref())?;

        // Every policy column is overwritten; nothing from an earlier record survives.
        // `updated_at` only moves when the policy actually changes. SET expressions
        // see the row as it was before the update.
        sqlx::query(
            "INSERT INTO position_followers \
             (position_hash, normalized_fen, follower, \
              dojo_enabled, dojo_min_cohort, dojo_max_cohort, dojo_disable_variations, \
              masters_enabled, masters_min_average_rating, masters_time_controls, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (position_hash, normalized_fen, follower) DO UPDATE SET \
              dojo_enabled = excluded.dojo_enabled, \
              dojo_min_cohort = excluded.dojo_min_cohort, \
              dojo_max_cohort = excluded.dojo_max_cohort, \
              dojo_disable_variations = excluded.dojo_disable_variations, \
              masters_enabled = excluded.masters_enabled, \
              masters_min_average_rating = excluded.masters_min_average_rating, \
              masters_time_controls = excluded.masters_time_controls, \
              updated_at = CASE WHEN \
                  position_followers.dojo_enabled IS excluded.dojo_enabled \
                  AND position_followers.dojo_min_cohort IS excluded.dojo_min_cohort \
                  AND position_followers.dojo_max_cohort IS excluded.dojo_max_cohort \
                  AND position_followers.dojo_disable_variations IS excluded.dojo_disable_variations \
                  AND position_followers.masters_enabled IS excluded.masters_enabled \
                  AND position_followers.masters_min_average_rating \
                      IS excluded.masters_min_average_rating \
                  AND position_followers.masters_time_controls IS excluded.masters_time_controls \
                THEN position_followers.updated_at ELSE excluded.updated_at END",
        )
        .bind(encode_hash(follower.position.hash))
        .bind(&follower.position.normalized_fen)
        .bind(&follower.follower)
        .bind(encode_bool(policy.dojo.enabled))
        .bind(&policy.dojo.min_cohort)
        .bind(&policy.dojo.max_cohort)
        .bind(encode_bool(policy.dojo.disable_variations))
        .bind(encode_bool(policy.masters.enabled))
        .bind(policy.masters.min_average_rating.map(i64::from))
        .bind(time_controls)
        .bind(follower.updated_at as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_follower(
        &self,
        position: &PositionKey,
        follower: &str,
    ) -> Result<bool, PersistenceError> {
        let result = sqlx::query(
            "DELETE FROM position_followers \
             WHERE position_hash = ? AND normalized_fen = ? AND follower = ?",
        )
        .bind(encode_hash(position.hash))
        .bind(&position.normalized_fen)
        .bind(follower)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn load_follower(
        &self,
        position: &PositionKey,
        follower: &str,
    ) -> Result<Option<ExplorerPositionFollower>, PersistenceError> {
        let row: Option<FollowerRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE position_hash = ? AND normalized_fen = ? AND follower = ?"
        ))
        .bind(encode_hash(position.hash))
        .bind(&position.normalized_fen)
        .bind(follower)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ExplorerPositionFollower::try_from).transpose()
    }

    async fn list_followers(
        &self,
        position: &PositionKey,
    ) -> Result<Vec<ExplorerPositionFollower>, PersistenceError> {
        let rows: Vec<FollowerRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE position_hash = ? AND normalized_fen = ? ORDER BY follower"
        ))
        .bind(encode_hash(position.hash))
        .bind(&position.normalized_fen)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExplorerPositionFollower::try_from).collect()
    }

    async fn list_followed(
        &self,
        follower: &str,
    ) -> Result<Vec<ExplorerPositionFollower>, PersistenceError> {
        let rows: Vec<FollowerRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE follower = ? ORDER BY updated_at DESC, normalized_fen"
        ))
        .bind(follower)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExplorerPositionFollower::try_from).collect()
    }
}
