//! Error taxonomy surfaced by the explorer core.
//!
//! Every variant is terminal: the core never retries. Callers that want retry
//! semantics can re-issue the request, since statistics reads, follow upserts
//! and unfollow deletes are all idempotent.

use crate::persistence::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] chess::FenError),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid follower: {0}")]
    InvalidFollower(String),
    #[error("invalid game {game_id}: {reason}")]
    InvalidGame { game_id: String, reason: String },
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] PersistenceError),
    #[error("malformed result: {0}")]
    MalformedResult(String),
}

impl From<PersistenceError> for ExplorerError {
    fn from(err: PersistenceError) -> Self {
        if err.is_malformed() {
            Self::MalformedResult(err.to_string())
        } else {
            Self::StoreUnavailable(err)
        }
    }
}
