//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: one writer and multiple concurrent readers.
//! - **Foreign keys enabled**: deleting a game cascades to its position rows.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/001_initial_schema.sql`
//!   when [`Database::open`] is called.
//!
//! ## Repository types
//!
//! Each `Sqlite*` type holds a `SqlitePool` and implements the corresponding
//! trait from [`crate::persistence::traits`]:
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqliteStatisticsStore`] | `StatisticsStore` |
//! | [`SqliteGameRepository`] | `GameRepository` |
//! | [`SqliteFollowerRepository`] | `FollowerRepository` |
//!
//! Position hashes are stored as signed `INTEGER`s; the bit pattern is
//! preserved by [`helpers::encode_hash`] / [`helpers::decode_hash`].

mod database;
mod follower_repo;
mod game_repo;
mod statistics_repo;
pub(crate) mod helpers;

pub use database::Database;
pub use follower_repo::SqliteFollowerRepository;
pub use game_repo::SqliteGameRepository;
pub use statistics_repo::SqliteStatisticsStore;
