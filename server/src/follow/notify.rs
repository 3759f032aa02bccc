//! Read path for the notification pipeline: given the followers of a position
//! and a game newly indexed at that position, pick who should be notified.
//! Delivery happens elsewhere.

use serde::{Deserialize, Serialize};

use crate::game::TimeClass;

use super::{DojoFollowPolicy, ExplorerPositionFollower, FollowPolicy, MastersFollowPolicy};

/// In-house rating bands, lowest first.
pub const DOJO_COHORTS: [&str; 23] = [
    "0-300",
    "300-400",
    "400-500",
    "500-600",
    "600-700",
    "700-800",
    "800-900",
    "900-1000",
    "1000-1100",
    "1100-1200",
    "1200-1300",
    "1300-1400",
    "1400-1500",
    "1500-1600",
    "1600-1700",
    "1700-1800",
    "1800-1900",
    "1900-2000",
    "2000-2100",
    "2100-2200",
    "2200-2300",
    "2300-2400",
    "2400+",
];

/// Position of `cohort` in [`DOJO_COHORTS`].
///
/// Besides exact band names, a bare lower bound (`"1400"`) resolves to the
/// band starting there.
pub fn cohort_index(cohort: &str) -> Option<usize> {
    let cohort = cohort.trim();
    if let Some(i) = DOJO_COHORTS.iter().position(|c| *c == cohort) {
        return Some(i);
    }
    let lower: u32 = cohort.parse().ok()?;
    DOJO_COHORTS.iter().position(|c| {
        c.split(['-', '+'])
            .next()
            .and_then(|l| l.parse::<u32>().ok())
            == Some(lower)
    })
}

/// Where a newly indexed game comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum GameSource {
    Dojo { cohort: String },
    Masters,
}

/// The facts about a new game that follow policies filter on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExplorerGame {
    pub source: GameSource,
    /// False when the position only appears in a side variation.
    pub in_mainline: bool,
    #[serde(default)]
    pub time_class: Option<TimeClass>,
    #[serde(default)]
    pub white_elo: Option<u32>,
    #[serde(default)]
    pub black_elo: Option<u32>,
}

impl FollowPolicy {
    /// Whether a follower with this policy wants to hear about `game`.
    pub fn wants(&self, game: &NewExplorerGame) -> bool {
        match &game.source {
            GameSource::Masters => self.masters.wants(game),
            GameSource::Dojo { cohort } => self.dojo.wants(cohort, game.in_mainline),
        }
    }
}

impl MastersFollowPolicy {
    fn wants(&self, game: &NewExplorerGame) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(allowed) = &self.time_controls {
            match game.time_class {
                Some(tc) if allowed.contains(&tc) => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_average_rating {
            // A missing Elo counts as 0. Compared as sums to stay in integers.
            let white = u64::from(game.white_elo.unwrap_or(0));
            let black = u64::from(game.black_elo.unwrap_or(0));
            let total = white + black;
            if total < u64::from(min) * 2 {
                return false;
            }
        }
        true
    }
}

impl DojoFollowPolicy {
    fn wants(&self, cohort: &str, in_mainline: bool) -> bool {
        if !self.enabled {
            return false;
        }
        if self.disable_variations && !in_mainline {
            return false;
        }
        if self.min_cohort.is_none() && self.max_cohort.is_none() {
            return true;
        }

        // A configured bound can only be satisfied by a known cohort. This
        // includes a lone maxCohort, which a plain index comparison (unknown
        // as -1) would let through.
        let Some(game) = cohort_index(cohort) else {
            return false;
        };
        let above_min = self
            .min_cohort
            .as_deref()
            .map_or(true, |min| cohort_index(min).is_some_and(|min| min <= game));
        let below_max = self
            .max_cohort
            .as_deref()
            .map_or(true, |max| cohort_index(max).is_some_and(|max| game <= max));
        above_min && below_max
    }
}

/// Followers whose policy accepts `game`.
pub fn select_recipients<'a>(
    followers: &'a [ExplorerPositionFollower],
    game: &NewExplorerGame,
) -> Vec<&'a ExplorerPositionFollower> {
    followers.iter().filter(|f| f.policy.wants(game)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dojo_game(cohort: &str, in_mainline: bool) -> NewExplorerGame {
        NewExplorerGame {
            source: GameSource::Dojo {
                cohort: cohort.to_string(),
            },
            in_mainline,
            time_class: None,
            white_elo: None,
            black_elo: None,
        }
    }

    fn masters_game(tc: Option<TimeClass>, white: u32, black: u32) -> NewExplorerGame {
        NewExplorerGame {
            source: GameSource::Masters,
            in_mainline: true,
            time_class: tc,
            white_elo: Some(white),
            black_elo: Some(black),
        }
    }

    fn dojo_policy(min: Option<&str>, max: Option<&str>, disable_variations: bool) -> FollowPolicy {
        FollowPolicy {
            dojo: DojoFollowPolicy {
                enabled: true,
                min_cohort: min.map(str::to_string),
                max_cohort: max.map(str::to_string),
                disable_variations,
            },
            masters: MastersFollowPolicy::default(),
        }
    }

    #[test]
    fn cohort_lookup() {
        assert_eq!(cohort_index("0-300"), Some(0));
        assert_eq!(cohort_index("2400+"), Some(22));
        assert_eq!(cohort_index("1400"), cohort_index("1400-1500"));
        assert_eq!(cohort_index("2400"), Some(22));
        assert_eq!(cohort_index("1450"), None);
        assert_eq!(cohort_index("masters"), None);
    }

    #[test]
    fn disabled_sections_never_notify() {
        let policy = FollowPolicy::default();
        assert!(!policy.wants(&dojo_game("1200-1300", true)));
        assert!(!policy.wants(&masters_game(None, 2700, 2700)));
    }

    #[test]
    fn dojo_cohort_bounds_are_inclusive() {
        let policy = dojo_policy(Some("1400-1500"), Some("1600-1700"), false);
        assert!(!policy.wants(&dojo_game("1300-1400", true)));
        assert!(policy.wants(&dojo_game("1400-1500", true)));
        assert!(policy.wants(&dojo_game("1600-1700", true)));
        assert!(!policy.wants(&dojo_game("1700-1800", true)));
        assert!(!policy.wants(&dojo_game("unknown", true)));
    }

    #[test]
    fn dojo_without_bounds_accepts_any_cohort() {
        let policy = dojo_policy(None, None, false);
        assert!(policy.wants(&dojo_game("0-300", false)));
        assert!(policy.wants(&dojo_game("something-new", true)));
    }

    #[test]
    fn variations_can_be_excluded() {
        let policy = dojo_policy(None, None, true);
        assert!(policy.wants(&dojo_game("1000-1100", true)));
        assert!(!policy.wants(&dojo_game("1000-1100", false)));
    }

    #[test]
    fn masters_filters_on_time_control_and_average() {
        let policy = FollowPolicy {
            dojo: DojoFollowPolicy::default(),
            masters: MastersFollowPolicy {
                enabled: true,
                min_average_rating: Some(2600),
                time_controls: Some(vec![TimeClass::Classical, TimeClass::Rapid]),
            },
        };
        assert!(policy.wants(&masters_game(Some(TimeClass::Classical), 2650, 2550)));
        assert!(!policy.wants(&masters_game(Some(TimeClass::Classical), 2650, 2500)));
        assert!(!policy.wants(&masters_game(Some(TimeClass::Blitz), 2800, 2800)));
        assert!(!policy.wants(&masters_game(None, 2800, 2800)));
        // Masters games never go through the dojo section.
        assert!(!policy.wants(&dojo_game("2400+", true)));
    }

    #[test]
    fn masters_missing_elo_counts_as_zero() {
        let policy = FollowPolicy {
            dojo: DojoFollowPolicy::default(),
            masters: MastersFollowPolicy {
                enabled: true,
                min_average_rating: Some(2000),
                time_controls: None,
            },
        };
        let mut game = masters_game(None, 3000, 0);
        game.black_elo = None;
        assert!(!policy.wants(&game));
    }

    #[test]
    fn masters_average_handles_extreme_elo() {
        let policy = FollowPolicy {
            dojo: DojoFollowPolicy::default(),
            masters: MastersFollowPolicy {
                enabled: true,
                min_average_rating: Some(2000),
                time_controls: None,
            },
        };
        assert!(policy.wants(&masters_game(None, u32::MAX, 10)));
        assert!(policy.wants(&masters_game(None, u32::MAX, u32::MAX)));

        let mut strict = policy.clone();
        strict.masters.min_average_rating = Some(u32::MAX);
        assert!(strict.wants(&masters_game(None, u32::MAX, u32::MAX)));
        assert!(!strict.wants(&masters_game(None, u32::MAX, u32::MAX - 1)));
    }

    #[test]
    fn unknown_cohort_fails_a_lone_max_bound() {
        let policy = dojo_policy(None, Some("1600-1700"), false);
        assert!(policy.wants(&dojo_game("1200-1300", true)));
        assert!(!policy.wants(&dojo_game("unrated", true)));
    }
}
