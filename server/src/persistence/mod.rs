//! Storage for the explorer: the per-game-per-position corpus the statistics
//! query runs over, and the position follow index.

pub mod sqlite;
pub mod traits;

pub use traits::{FollowerRepository, GameRepository, StatisticsStore};

use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Malformed row: {0}")]
    Malformed(String),
}

impl PersistenceError {
    /// True when the store answered but its data could not be interpreted.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Malformed(_) | Self::Json(_) => true,
            Self::Sqlx(e) => matches!(
                e,
                sqlx::Error::ColumnDecode { .. }
                    | sqlx::Error::ColumnNotFound(_)
                    | sqlx::Error::ColumnIndexOutOfBounds { .. }
                    | sqlx::Error::Decode(_)
                    | sqlx::Error::TypeNotFound { .. }
            ),
            Self::Io(_) | Self::Migration(_) => false,
        }
    }
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
