//! Position follow index: subscription records and their notification policy.
//!
//! A record is identified by `(position key, follower)`. Following upserts the
//! whole [`FollowPolicy`]; there is no partial update of one section.

pub mod notify;

use chess::PositionKey;
use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;
use crate::game::TimeClass;

pub use notify::{cohort_index, select_recipients, GameSource, NewExplorerGame, DOJO_COHORTS};

/// Notification settings for games from the in-house corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DojoFollowPolicy {
    pub enabled: bool,
    /// Inclusive lower cohort bound; `None` means no minimum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cohort: Option<String>,
    /// Inclusive upper cohort bound; `None` means no maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cohort: Option<String>,
    /// Skip games where the position only occurs in a side variation.
    #[serde(default)]
    pub disable_variations: bool,
}

/// Notification settings for games from the masters corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MastersFollowPolicy {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_average_rating: Option<u32>,
    /// Allowed time classes; `None` allows all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_controls: Option<Vec<TimeClass>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowPolicy {
    pub dojo: DojoFollowPolicy,
    pub masters: MastersFollowPolicy,
}

impl FollowPolicy {
    pub fn validate(&self) -> Result<(), ExplorerError> {
        let min = self.dojo.min_cohort.as_deref().map(checked_cohort).transpose()?;
        let max = self.dojo.max_cohort.as_deref().map(checked_cohort).transpose()?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ExplorerError::InvalidFilter(format!(
                    "minCohort {} is above maxCohort {}",
                    DOJO_COHORTS[min], DOJO_COHORTS[max]
                )));
            }
        }
        Ok(())
    }
}

fn checked_cohort(cohort: &str) -> Result<usize, ExplorerError> {
    cohort_index(cohort)
        .ok_or_else(|| ExplorerError::InvalidFilter(format!("unknown cohort: {cohort}")))
}

/// A follow or unfollow request.
///
/// On the wire this is `{ fen, unfollow, metadata? }`; a follow must carry
/// `metadata` and an unfollow must not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FollowPositionWire", into = "FollowPositionWire")]
pub enum FollowPositionRequest {
    Follow { fen: String, policy: FollowPolicy },
    Unfollow { fen: String },
}

impl FollowPositionRequest {
    pub fn fen(&self) -> &str {
        match self {
            Self::Follow { fen, .. } | Self::Unfollow { fen } => fen,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FollowPositionWire {
    fen: String,
    unfollow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<FollowPolicy>,
}

impl TryFrom<FollowPositionWire> for FollowPositionRequest {
    type Error = String;

    fn try_from(wire: FollowPositionWire) -> Result<Self, Self::Error> {
        match (wire.unfollow, wire.metadata) {
            (false, Some(policy)) => Ok(Self::Follow {
                fen: wire.fen,
                policy,
            }),
            (true, None) => Ok(Self::Unfollow { fen: wire.fen }),
            (false, None) => Err("a follow request requires metadata".to_string()),
            (true, Some(_)) => Err("an unfollow request must not carry metadata".to_string()),
        }
    }
}

impl From<FollowPositionRequest> for FollowPositionWire {
    fn from(req: FollowPositionRequest) -> Self {
        match req {
            FollowPositionRequest::Follow { fen, policy } => Self {
                fen,
                unfollow: false,
                metadata: Some(policy),
            },
            FollowPositionRequest::Unfollow { fen } => Self {
                fen,
                unfollow: true,
                metadata: None,
            },
        }
    }
}

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerPositionFollower {
    pub follower: String,
    pub position: PositionKey,
    pub policy: FollowPolicy,
    pub updated_at: u64,
}

/// What a follow/unfollow call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed(ExplorerPositionFollower),
    Unfollowed { position: PositionKey, existed: bool },
}
