//! Player position explorer: per-move statistics over a player's own games,
//! and position follows for new-game notifications.

pub mod config;
pub mod error;
pub mod explorer;
pub mod follow;
pub mod game;
pub mod ingest;
pub mod persistence;

pub use error::ExplorerError;
pub use explorer::{ExplorerService, SqliteExplorer};
