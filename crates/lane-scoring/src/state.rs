//! Lane-keeping state tracking

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

/// Where the vehicle is relative to its lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneState {
    #[default]
    OutOfLane,
    /// Correctly positioned, dwell not yet elapsed
    EnteringLane,
    /// Dwell elapsed; awards are due every award gap
    InLaneQualified,
}

/// Identity of one live episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(Uuid);

impl EpisodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Points taken out of a finished episode
#[must_use = "the points are lost unless the total is committed"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpisodeTotal {
    pub episode: Option<EpisodeId>,
    pub points: u32,
}

/// Scoring state of the current live episode
#[derive(Debug, Clone, Default)]
pub struct ScoringState {
    pub is_live: bool,

    /// Points accrued since the episode started
    pub accrued_points: u32,

    /// Start of the current correct-position run
    pub correct_position_since: Option<Instant>,

    /// Time of the most recent award
    pub last_award_at: Option<Instant>,

    pub lane_state: LaneState,

    pub episode: Option<EpisodeId>,
}

impl ScoringState {
    /// Start a fresh episode: zero points, out of lane, live
    pub fn begin_episode(&mut self) -> EpisodeId {
        let episode = EpisodeId::new();
        *self = Self {
            is_live: true,
            episode: Some(episode),
            ..Default::default()
        };
        episode
    }

    /// Leave live mode and take the accrued points, leaving 0 behind.
    ///
    /// A second call returns a total of 0 for no episode.
    pub fn end_episode(&mut self) -> EpisodeTotal {
        let total = EpisodeTotal {
            episode: self.episode.take(),
            points: std::mem::take(&mut self.accrued_points),
        };
        self.is_live = false;
        self.lane_state = LaneState::OutOfLane;
        self.correct_position_since = None;
        self.last_award_at = None;
        total
    }

    /// Drop out of lane and clear the dwell. The award gap is kept.
    pub fn interrupt(&mut self) {
        self.lane_state = LaneState::OutOfLane;
        self.correct_position_since = None;
    }
}
