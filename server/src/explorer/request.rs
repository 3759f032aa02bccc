//! The filter contract for player statistics queries.

use chess::Side;
use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;
use crate::game::{GameResult, TimeClass};

/// Smallest accepted `limit`.
pub const MIN_LIMIT: u32 = 100;

/// Bounds used for a range endpoint the caller left open.
pub const DEFAULT_RANGE_MIN: u32 = 0;
pub const DEFAULT_RANGE_MAX: u32 = 10_000;

/// Outcome of a game from the requesting player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFilter {
    Win,
    Draw,
    Loss,
}

impl ResultFilter {
    pub const ALL: [Self; 3] = [Self::Win, Self::Draw, Self::Loss];

    /// Translate to the stored result for a player who had `color`.
    pub fn stored_result(self, color: Side) -> GameResult {
        match self {
            Self::Win => GameResult::win_for(color),
            Self::Loss => GameResult::win_for(color.opponent()),
            Self::Draw => GameResult::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Rated,
    Casual,
}

impl GameMode {
    pub fn is_rated(self) -> bool {
        matches!(self, Self::Rated)
    }
}

/// An inclusive range with optional endpoints, `[min, max]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "(Option<u32>, Option<u32>)", into = "(Option<u32>, Option<u32>)")]
pub struct RangeFilter {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl RangeFilter {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Endpoints with open ends replaced by `[0, 10000]`.
    pub fn bounds(&self) -> (u32, u32) {
        (
            self.min.unwrap_or(DEFAULT_RANGE_MIN),
            self.max.unwrap_or(DEFAULT_RANGE_MAX),
        )
    }
}

impl From<(Option<u32>, Option<u32>)> for RangeFilter {
    fn from((min, max): (Option<u32>, Option<u32>)) -> Self {
        Self { min, max }
    }
}

impl From<RangeFilter> for (Option<u32>, Option<u32>) {
    fn from(r: RangeFilter) -> Self {
        (r.min, r.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatisticsRequest {
    #[serde(alias = "player")]
    pub player_id: i64,
    #[serde(alias = "fen")]
    pub position: String,
    pub color: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<ResultFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GameMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_class: Option<Vec<TimeClass>>,
    #[serde(default, alias = "opponentRating", skip_serializing_if = "Option::is_none")]
    pub opponent_rating_range: Option<RangeFilter>,
    #[serde(default, alias = "plyCount", skip_serializing_if = "Option::is_none")]
    pub ply_count_range: Option<RangeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PlayerStatisticsRequest {
    /// A request with only the mandatory fields set.
    pub fn new(player_id: i64, position: impl Into<String>, color: Side) -> Self {
        Self {
            player_id,
            position: position.into(),
            color,
            result: None,
            mode: None,
            time_class: None,
            opponent_rating_range: None,
            ply_count_range: None,
            limit: None,
        }
    }

    /// Reject filter combinations before any store access.
    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.player_id < 0 {
            return Err(ExplorerError::InvalidFilter(format!(
                "player id must not be negative, got {}",
                self.player_id
            )));
        }
        if let Some(limit) = self.limit {
            if limit < MIN_LIMIT {
                return Err(ExplorerError::InvalidFilter(format!(
                    "limit must be at least {MIN_LIMIT}, got {limit}"
                )));
            }
        }
        check_range("opponentRating", self.opponent_rating_range)?;
        check_range("plyCount", self.ply_count_range)?;
        Ok(())
    }
}

fn check_range(name: &str, range: Option<RangeFilter>) -> Result<(), ExplorerError> {
    if let Some(range) = range {
        let (min, max) = range.bounds();
        if min > max {
            return Err(ExplorerError::InvalidFilter(format!(
                "{name} range is inverted: [{min}, {max}]"
            )));
        }
    }
    Ok(())
}
