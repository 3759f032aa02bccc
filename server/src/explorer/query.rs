//! Statistics query builder.
//!
//! Filters are collected as typed [`Predicate`]s over a closed set of
//! [`Column`]s and rendered in a single pass. Every caller-supplied value ends
//! up in [`StatisticsQuery::params`]; the SQL text only ever contains column
//! names, placeholders and the fixed result literals of [`GameResult`].

use chess::{PositionKey, Side};

use crate::game::{GameResult, TimeClass};

use super::request::{PlayerStatisticsRequest, RangeFilter, ResultFilter};

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Int(i64),
    Text(String),
    Bool(bool),
    /// A structural position hash; the backend picks its column encoding.
    Hash(u64),
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for QueryParam {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Columns a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    PlayerId,
    PositionHash,
    Color,
    NormalizedFen,
    Result,
    Rated,
    TimeClass,
    WhiteRating,
    BlackRating,
    PlyCount,
}

impl Column {
    pub fn sql(self) -> &'static str {
        match self {
            Self::PlayerId => "p.player_id",
            Self::PositionHash => "p.position_hash",
            Self::Color => "p.color",
            Self::NormalizedFen => "p.normalized_fen",
            Self::Result => "g.result",
            Self::Rated => "g.rated",
            Self::TimeClass => "g.time_class",
            Self::WhiteRating => "g.white_rating",
            Self::BlackRating => "g.black_rating",
            Self::PlyCount => "g.ply_count",
        }
    }

    /// Rating column of the player facing `color`.
    pub fn opponent_rating(color: Side) -> Self {
        match color {
            Side::White => Self::BlackRating,
            Side::Black => Self::WhiteRating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq(Column, QueryParam),
    In(Column, Vec<QueryParam>),
    Between(Column, QueryParam, QueryParam),
}

impl Predicate {
    fn render(&self, sql: &mut String, params: &mut Vec<QueryParam>) {
        match self {
            Self::Eq(col, value) => {
                sql.push_str(col.sql());
                sql.push_str(" = ?");
                params.push(value.clone());
            }
            Self::In(col, values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("{} IN ({placeholders})", col.sql()));
                params.extend(values.iter().cloned());
            }
            Self::Between(col, lo, hi) => {
                sql.push_str(col.sql());
                sql.push_str(" BETWEEN ? AND ?");
                params.push(lo.clone());
                params.push(hi.clone());
            }
        }
    }
}

/// A rendered statement plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

/// Accumulates predicates, then renders the two-level aggregate statement.
#[derive(Debug, Clone, Default)]
pub struct StatisticsQueryBuilder {
    predicates: Vec<Predicate>,
    limit: Option<u32>,
}

impl StatisticsQueryBuilder {
    /// Start from the four equality predicates every query carries.
    pub fn for_position(player_id: i64, key: &PositionKey, color: Side) -> Self {
        let mut builder = Self::default();
        builder
            .push(Predicate::Eq(Column::PlayerId, player_id.into()))
            .push(Predicate::Eq(Column::PositionHash, QueryParam::Hash(key.hash)))
            .push(Predicate::Eq(Column::Color, color.as_str().into()))
            .push(Predicate::Eq(
                Column::NormalizedFen,
                key.normalized_fen.as_str().into(),
            ));
        builder
    }

    pub fn push(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> StatisticsQuery {
        let mut params = Vec::new();
        let mut sql = String::from(
            "SELECT san, \
             SUM(white_rating) AS total_white_rating, \
             SUM(black_rating) AS total_black_rating, \
             COUNT(*) AS total_games, ",
        );
        sql.push_str(&format!(
            "SUM(CASE WHEN result = '{}' THEN 1 ELSE 0 END) AS white_wins, \
             SUM(CASE WHEN result = '{}' THEN 1 ELSE 0 END) AS black_wins, \
             SUM(CASE WHEN result = '{}' THEN 1 ELSE 0 END) AS draws ",
            GameResult::WhiteWins.as_str(),
            GameResult::BlackWins.as_str(),
            GameResult::Draw.as_str(),
        ));
        sql.push_str(
            "FROM (SELECT p.san AS san, \
             g.normalized_white_rating AS white_rating, \
             g.normalized_black_rating AS black_rating, \
             g.result AS result \
             FROM game_positions p \
             JOIN games g ON g.game_id = p.game_id \
             WHERE ",
        );

        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            predicate.render(&mut sql, &mut params);
        }

        if let Some(limit) = self.limit {
            sql.push_str(" ORDER BY g.played_at DESC LIMIT ?");
            params.push(limit.into());
        }

        sql.push_str(") GROUP BY san ORDER BY total_games DESC, san ASC");
        StatisticsQuery { sql, params }
    }
}

/// The values of `requested` worth filtering on, in `all` order.
///
/// `None` means "do not emit a predicate": the field was omitted, listed
/// nothing, or listed every value (which restricts nothing).
pub fn effective_subset<T: Copy + PartialEq>(requested: Option<&[T]>, all: &[T]) -> Option<Vec<T>> {
    let requested = requested?;
    let subset: Vec<T> = all
        .iter()
        .copied()
        .filter(|v| requested.contains(v))
        .collect();

    if subset.is_empty() || subset.len() == all.len() {
        None
    } else {
        Some(subset)
    }
}

/// Build the aggregate statement for a validated request.
pub fn build_statistics_query(req: &PlayerStatisticsRequest, key: &PositionKey) -> StatisticsQuery {
    let mut builder = StatisticsQueryBuilder::for_position(req.player_id, key, req.color);

    if let Some(results) = effective_subset(req.result.as_deref(), &ResultFilter::ALL) {
        let values = results
            .into_iter()
            .map(|r| r.stored_result(req.color).as_str().into())
            .collect();
        builder.push(Predicate::In(Column::Result, values));
    }

    if let Some(mode) = req.mode {
        builder.push(Predicate::Eq(Column::Rated, mode.is_rated().into()));
    }

    if let Some(classes) = effective_subset(req.time_class.as_deref(), &TimeClass::ALL) {
        let values = classes.into_iter().map(|t| t.as_str().into()).collect();
        builder.push(Predicate::In(Column::TimeClass, values));
    }

    if let Some(range) = req.opponent_rating_range {
        builder.push(between(Column::opponent_rating(req.color), range));
    }

    if let Some(range) = req.ply_count_range {
        builder.push(between(Column::PlyCount, range));
    }

    if let Some(limit) = req.limit {
        builder.limit(limit);
    }

    builder.build()
}

fn between(column: Column, range: RangeFilter) -> Predicate {
    let (lo, hi) = range.bounds();
    Predicate::Between(column, lo.into(), hi.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::request::GameMode;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn key() -> PositionKey {
        chess::canonicalize(START).unwrap()
    }

    fn base(color: Side) -> PlayerStatisticsRequest {
        PlayerStatisticsRequest::new(123, START, color)
    }

    #[test]
    fn required_predicates_only() {
        let q = build_statistics_query(&base(Side::White), &key());
        assert!(q.sql.contains(
            "WHERE p.player_id = ? AND p.position_hash = ? AND p.color = ? AND p.normalized_fen = ?)"
        ));
        assert_eq!(
            q.params,
            vec![
                QueryParam::Int(123),
                QueryParam::Hash(key().hash),
                QueryParam::Text("white".into()),
                QueryParam::Text(START.into()),
            ]
        );
        assert!(!q.sql.contains("LIMIT"));
        assert!(q.sql.ends_with("GROUP BY san ORDER BY total_games DESC, san ASC"));
    }

    #[test]
    fn result_filter_maps_relative_to_color() {
        let mut white = base(Side::White);
        white.result = Some(vec![ResultFilter::Win]);
        let q = build_statistics_query(&white, &key());
        assert!(q.sql.contains("g.result IN (?)"));
        assert_eq!(q.params[4], QueryParam::Text("1-0".into()));

        let mut black = base(Side::Black);
        black.result = Some(vec![ResultFilter::Win]);
        let q = build_statistics_query(&black, &key());
        assert_eq!(q.params[4], QueryParam::Text("0-1".into()));

        black.result = Some(vec![ResultFilter::Loss, ResultFilter::Draw]);
        let q = build_statistics_query(&black, &key());
        assert!(q.sql.contains("g.result IN (?, ?)"));
        // Rendered in canonical win/draw/loss order regardless of input order.
        assert_eq!(q.params[4], QueryParam::Text("1/2-1/2".into()));
        assert_eq!(q.params[5], QueryParam::Text("1-0".into()));
    }

    #[test]
    fn full_sets_are_elided() {
        let plain = build_statistics_query(&base(Side::White), &key());

        let mut all = base(Side::White);
        all.result = Some(vec![ResultFilter::Loss, ResultFilter::Win, ResultFilter::Draw]);
        all.time_class = Some(TimeClass::ALL.to_vec());
        assert_eq!(build_statistics_query(&all, &key()), plain);
    }

    #[test]
    fn empty_sets_are_elided() {
        let plain = build_statistics_query(&base(Side::Black), &key());

        let mut empty = base(Side::Black);
        empty.result = Some(vec![]);
        empty.time_class = Some(vec![]);
        assert_eq!(build_statistics_query(&empty, &key()), plain);
    }

    #[test]
    fn duplicates_collapse() {
        let mut dup = base(Side::White);
        dup.time_class = Some(vec![TimeClass::Blitz, TimeClass::Blitz, TimeClass::Bullet]);
        let q = build_statistics_query(&dup, &key());
        assert!(q.sql.contains("g.time_class IN (?, ?)"));
        assert_eq!(
            &q.params[4..],
            &[QueryParam::Text("bullet".into()), QueryParam::Text("blitz".into())]
        );
    }

    #[test]
    fn mode_filter_binds_rated_flag() {
        let mut req = base(Side::White);
        req.mode = Some(GameMode::Casual);
        let q = build_statistics_query(&req, &key());
        assert!(q.sql.contains("g.rated = ?"));
        assert_eq!(q.params[4], QueryParam::Bool(false));
    }

    #[test]
    fn opponent_rating_uses_opposite_color_column() {
        let mut req = base(Side::White);
        req.opponent_rating_range = Some(RangeFilter::new(Some(1200), None));
        let q = build_statistics_query(&req, &key());
        assert!(q.sql.contains("g.black_rating BETWEEN ? AND ?"));
        assert_eq!(&q.params[4..], &[QueryParam::Int(1200), QueryParam::Int(10_000)]);

        req.color = Side::Black;
        let q = build_statistics_query(&req, &key());
        assert!(q.sql.contains("g.white_rating BETWEEN ? AND ?"));
    }

    #[test]
    fn ply_count_is_not_color_inverted() {
        let mut req = base(Side::Black);
        req.ply_count_range = Some(RangeFilter::new(None, Some(60)));
        let q = build_statistics_query(&req, &key());
        assert!(q.sql.contains("g.ply_count BETWEEN ? AND ?"));
        assert_eq!(&q.params[4..], &[QueryParam::Int(0), QueryParam::Int(60)]);
    }

    #[test]
    fn limit_caps_rows_before_grouping() {
        let mut req = base(Side::White);
        req.limit = Some(250);
        let q = build_statistics_query(&req, &key());
        let limit_at = q.sql.find("ORDER BY g.played_at DESC LIMIT ?").unwrap();
        let group_at = q.sql.find("GROUP BY san").unwrap();
        assert!(limit_at < group_at);
        assert_eq!(q.params.last(), Some(&QueryParam::Int(250)));
    }

    #[test]
    fn placeholders_match_params() {
        let mut req = base(Side::Black);
        req.result = Some(vec![ResultFilter::Win]);
        req.mode = Some(GameMode::Rated);
        req.time_class = Some(vec![TimeClass::Rapid, TimeClass::Daily]);
        req.opponent_rating_range = Some(RangeFilter::new(Some(1000), Some(2000)));
        req.ply_count_range = Some(RangeFilter::new(Some(20), None));
        req.limit = Some(100);
        let q = build_statistics_query(&req, &key());
        assert_eq!(q.sql.matches('?').count(), q.params.len());
        assert_eq!(q.params.len(), 4 + 1 + 1 + 2 + 2 + 2 + 1);
    }

    #[test]
    fn hostile_fen_text_is_only_a_parameter() {
        let hostile = PositionKey {
            normalized_fen: "x' OR 1=1 --".into(),
            hash: 1,
        };
        let q = StatisticsQueryBuilder::for_position(1, &hostile, Side::White).build();
        assert!(!q.sql.contains("OR 1=1"));
        assert!(q.params.contains(&QueryParam::Text("x' OR 1=1 --".into())));
    }

    #[test]
    fn effective_subset_policy() {
        let all = [1, 2, 3];
        assert_eq!(effective_subset(None, &all), None);
        assert_eq!(effective_subset(Some(&[][..]), &all), None);
        assert_eq!(effective_subset(Some(&[3, 1, 2][..]), &all), None);
        assert_eq!(effective_subset(Some(&[3, 1][..]), &all), Some(vec![1, 3]));
        assert_eq!(effective_subset(Some(&[9][..]), &all), None);
    }
}
