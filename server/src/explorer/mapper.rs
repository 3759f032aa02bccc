//! Maps raw aggregate rows into the public response shape.

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

/// One row as read positionally from the store, before validation.
///
/// Columns: `san, total_white_rating, total_black_rating, total_games,
/// white_wins, black_wins, draws`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAggregateRow {
    pub san: Option<String>,
    pub total_white_rating: Option<i64>,
    pub total_black_rating: Option<i64>,
    pub total_games: Option<i64>,
    pub white_wins: Option<i64>,
    pub black_wins: Option<i64>,
    pub draws: Option<i64>,
}

/// Aggregated statistics for one move played from the queried position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAggregateRow {
    #[serde(rename = "move")]
    pub san: String,
    pub total_white_rating_sum: i64,
    pub total_black_rating_sum: i64,
    pub total_games: u64,
    pub white_wins: u64,
    pub black_wins: u64,
    pub draws: u64,
}

impl TryFrom<RawAggregateRow> for MoveAggregateRow {
    type Error = ExplorerError;

    fn try_from(raw: RawAggregateRow) -> Result<Self, Self::Error> {
        let san = raw
            .san
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed("move column is missing or empty"))?;

        let row = Self {
            total_white_rating_sum: required(raw.total_white_rating, &san, "total_white_rating")?,
            total_black_rating_sum: required(raw.total_black_rating, &san, "total_black_rating")?,
            total_games: count(raw.total_games, &san, "total_games")?,
            white_wins: count(raw.white_wins, &san, "white_wins")?,
            black_wins: count(raw.black_wins, &san, "black_wins")?,
            draws: count(raw.draws, &san, "draws")?,
            san,
        };

        if row.white_wins + row.black_wins + row.draws != row.total_games {
            return Err(malformed(format!(
                "results for {} do not add up: {} + {} + {} != {}",
                row.san, row.white_wins, row.black_wins, row.draws, row.total_games
            )));
        }
        Ok(row)
    }
}

/// Validate every row; a single bad row fails the whole response.
pub fn map_rows(raw: Vec<RawAggregateRow>) -> Result<Vec<MoveAggregateRow>, ExplorerError> {
    raw.into_iter().map(MoveAggregateRow::try_from).collect()
}

fn required(value: Option<i64>, san: &str, column: &str) -> Result<i64, ExplorerError> {
    value.ok_or_else(|| malformed(format!("{column} is NULL for {san}")))
}

fn count(value: Option<i64>, san: &str, column: &str) -> Result<u64, ExplorerError> {
    let value = required(value, san, column)?;
    u64::try_from(value).map_err(|_| malformed(format!("{column} is negative for {san}: {value}")))
}

fn malformed(msg: impl Into<String>) -> ExplorerError {
    ExplorerError::MalformedResult(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(san: &str, games: i64, white: i64, black: i64, draws: i64) -> RawAggregateRow {
        RawAggregateRow {
            san: Some(san.to_string()),
            total_white_rating: Some(1500 * games),
            total_black_rating: Some(1400 * games),
            total_games: Some(games),
            white_wins: Some(white),
            black_wins: Some(black),
            draws: Some(draws),
        }
    }

    #[test]
    fn maps_valid_rows_in_order() {
        let rows = map_rows(vec![raw("e4", 10, 5, 3, 2), raw("d4", 4, 1, 1, 2)]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].san, "e4");
        assert_eq!(rows[0].total_games, 10);
        assert_eq!(rows[0].total_white_rating_sum, 15_000);
        assert_eq!(rows[1].san, "d4");
        assert_eq!(rows[1].total_black_rating_sum, 5_600);
    }

    #[test]
    fn missing_column_fails_whole_response() {
        let mut bad = raw("Nf3", 3, 1, 1, 1);
        bad.draws = None;
        let err = map_rows(vec![raw("e4", 1, 1, 0, 0), bad]).unwrap_err();
        assert!(matches!(err, ExplorerError::MalformedResult(_)));
    }

    #[test]
    fn empty_move_is_malformed() {
        let mut bad = raw("", 1, 1, 0, 0);
        assert!(MoveAggregateRow::try_from(bad.clone()).is_err());
        bad.san = None;
        assert!(MoveAggregateRow::try_from(bad).is_err());
    }

    #[test]
    fn negative_count_is_malformed() {
        assert!(MoveAggregateRow::try_from(raw("e4", 1, 2, -1, 0)).is_err());
    }

    #[test]
    fn results_must_add_up() {
        let err = MoveAggregateRow::try_from(raw("e4", 10, 5, 3, 1)).unwrap_err();
        assert!(err.to_string().contains("do not add up"));
    }

    #[test]
    fn serializes_move_field_name() {
        let row = MoveAggregateRow::try_from(raw("c4", 2, 1, 0, 1)).unwrap();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["move"], "c4");
        assert_eq!(json["totalGames"], 2);
        assert_eq!(json["totalWhiteRatingSum"], 3000);
    }
}
