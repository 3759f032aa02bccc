//! Turns a played game into the per-game-per-position rows the statistics
//! query runs over.
//!
//! Each mainline ply contributes one row keyed by the canonical position the
//! move was played *from*. A game that reaches the same position again and
//! repeats the same move is counted once for that move.

use std::collections::HashSet;

use chess::pgn::{parse_movetext, replay};
use chess::{parse_fen, PositionKey, Side};
use cozy_chess::Board;
use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;
use crate::game::{GameResult, TimeClass};

/// A finished game as submitted for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Assigned on import when left empty.
    #[serde(default)]
    pub game_id: String,
    pub player_id: i64,
    /// The side the indexed player had.
    pub player_color: Side,
    pub result: GameResult,
    pub rated: bool,
    pub time_class: TimeClass,
    pub white_rating: u32,
    pub black_rating: u32,
    /// Ratings converted to the in-house scale; default to the raw rating.
    #[serde(default)]
    pub normalized_white_rating: Option<u32>,
    #[serde(default)]
    pub normalized_black_rating: Option<u32>,
    /// Unix timestamp (seconds) the game was played at.
    pub played_at: i64,
    /// Start position; the standard position when absent.
    #[serde(default)]
    pub start_fen: Option<String>,
    /// PGN movetext of the game.
    pub moves: String,
}

/// One indexed position of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePositionRow {
    pub ply: u32,
    pub key: PositionKey,
    pub san: String,
}

/// A game ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGame {
    pub record: GameRecord,
    pub ply_count: u32,
    pub positions: Vec<GamePositionRow>,
}

impl IndexedGame {
    pub fn normalized_white_rating(&self) -> u32 {
        self.record
            .normalized_white_rating
            .unwrap_or(self.record.white_rating)
    }

    pub fn normalized_black_rating(&self) -> u32 {
        self.record
            .normalized_black_rating
            .unwrap_or(self.record.black_rating)
    }
}

/// Replay the game's mainline and build its position rows.
pub fn index_game(record: GameRecord) -> Result<IndexedGame, ExplorerError> {
    let invalid = |reason: String| ExplorerError::InvalidGame {
        game_id: record.game_id.clone(),
        reason,
    };

    if record.game_id.trim().is_empty() {
        return Err(invalid("game id is empty".to_string()));
    }

    let start = match &record.start_fen {
        Some(fen) => parse_fen(fen).map_err(|e| invalid(e.to_string()))?,
        None => Board::default(),
    };
    let sans = parse_movetext(&record.moves).map_err(|e| invalid(e.to_string()))?;
    let plies = replay(&start, &sans).map_err(|e| invalid(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut positions = Vec::with_capacity(plies.len());
    for ply in &plies {
        let key = PositionKey::from_board(&ply.before).map_err(|e| invalid(e.to_string()))?;
        if seen.insert((key.hash, ply.san.clone())) {
            positions.push(GamePositionRow {
                ply: ply.ply,
                key,
                san: ply.san.clone(),
            });
        }
    }

    tracing::debug!(
        game_id = %record.game_id,
        plies = plies.len(),
        positions = positions.len(),
        "Indexed game"
    );

    Ok(IndexedGame {
        ply_count: plies.len() as u32,
        positions,
        record,
    })
}
