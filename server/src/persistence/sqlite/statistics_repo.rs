//! SQLite-backed implementation of [`StatisticsStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::helpers::encode_hash;
use crate::explorer::mapper::RawAggregateRow;
use crate::explorer::query::{QueryParam, StatisticsQuery};
use crate::persistence::traits::StatisticsStore;
use crate::persistence::PersistenceError;

pub struct SqliteStatisticsStore {
    pool: SqlitePool,
}

impl SqliteStatisticsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl StatisticsStore for SqliteStatisticsStore {
    async fn run_statistics(
        &self,
        query: &StatisticsQuery,
    ) -> Result<Vec<RawAggregateRow>, PersistenceError> {
        let mut statement = sqlx::query(&query.sql);
        for param in &query.params {
            statement = match param {
                QueryParam::Int(v) => statement.bind(*v),
                QueryParam::Text(v) => statement.bind(v.clone()),
                QueryParam::Bool(v) => statement.bind(*v),
                QueryParam::Hash(v) => statement.bind(encode_hash(*v)),
            };
        }

        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Read the seven aggregate columns by position.
fn decode_row(row: &SqliteRow) -> Result<RawAggregateRow, PersistenceError> {
    if row.len() != 7 {
        return Err(PersistenceError::Malformed(format!(
            "expected 7 columns, got {}",
            row.len()
        )));
    }
    Ok(RawAggregateRow {
        san: row.try_get(0)?,
        total_white_rating: row.try_get(1)?,
        total_black_rating: row.try_get(2)?,
        total_games: row.try_get(3)?,
        white_wins: row.try_get(4)?,
        black_wins: row.try_get(5)?,
        draws: row.try_get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    #[tokio::test]
    async fn binds_every_param_kind() {
        let db = Database::new_in_memory().await.unwrap();
        let store = SqliteStatisticsStore::new(db.pool().clone());
        let query = StatisticsQuery {
            sql: "SELECT ?, ?, NULL, CASE WHEN ? THEN 3 ELSE 0 END, ?, 1, 1".to_string(),
            params: vec![
                QueryParam::Text("e4".into()),
                QueryParam::Int(4500),
                QueryParam::Bool(true),
                QueryParam::Hash(u64::MAX),
            ],
        };
        let rows = store.run_statistics(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].san.as_deref(), Some("e4"));
        assert_eq!(rows[0].total_white_rating, Some(4500));
        assert_eq!(rows[0].total_black_rating, None);
        assert_eq!(rows[0].total_games, Some(3));
        // Hashes are bound with their bit pattern reinterpreted as signed.
        assert_eq!(rows[0].white_wins, Some(-1));
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let db = Database::new_in_memory().await.unwrap();
        let store = SqliteStatisticsStore::new(db.pool().clone());
        let query = StatisticsQuery {
            sql: "SELECT 'e4', 1".to_string(),
            params: Vec::new(),
        };
        let err = store.run_statistics(&query).await.unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn bad_sql_is_not_malformed() {
        let db = Database::new_in_memory().await.unwrap();
        let store = SqliteStatisticsStore::new(db.pool().clone());
        let query = StatisticsQuery {
            sql: "SELECT * FROM no_such_table".to_string(),
            params: Vec::new(),
        };
        let err = store.run_statistics(&query).await.unwrap_err();
        assert!(!err.is_malformed());
    }
}
