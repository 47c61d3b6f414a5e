//! Lane-keeping scorer
//!
//! Hysteresis/dwell state machine driven by the lane-indicator count of each
//! overlay result. One tick with a non-qualifying count resets the dwell.

use crate::state::{LaneState, ScoringState};
use crate::{ScoringConfig, ScoringError};
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

/// Result of feeding one lane-indicator count to the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// The state was not live; nothing changed
    NotLive,
    Scored { lane_state: LaneState, awarded: u32 },
}

impl TickOutcome {
    pub fn awarded(&self) -> u32 {
        match self {
            TickOutcome::NotLive => 0,
            TickOutcome::Scored { awarded, .. } => *awarded,
        }
    }
}

/// Lane-keeping scorer
#[derive(Debug, Clone)]
pub struct LaneKeepingScorer {
    config: ScoringConfig,
}

impl LaneKeepingScorer {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Apply one lane-indicator count observed at `now`
    pub fn update(&self, state: &mut ScoringState, count: u32, now: Instant) -> TickOutcome {
        if !state.is_live {
            return TickOutcome::NotLive;
        }

        if count != self.config.qualifying_count {
            if state.lane_state != LaneState::OutOfLane {
                debug!("Lane count {} - out of lane, dwell reset", count);
            }
            state.interrupt();
            return TickOutcome::Scored {
                lane_state: LaneState::OutOfLane,
                awarded: 0,
            };
        }

        if state.lane_state == LaneState::OutOfLane {
            state.lane_state = LaneState::EnteringLane;
            state.correct_position_since = Some(now);
        }

        if state.lane_state == LaneState::EnteringLane {
            let since = *state.correct_position_since.get_or_insert(now);
            if now.saturating_duration_since(since) >= self.config.dwell() {
                debug!("Dwell elapsed, lane keeping qualified");
                state.lane_state = LaneState::InLaneQualified;
            }
        }

        let mut awarded = 0;
        if state.lane_state == LaneState::InLaneQualified {
            let due = state
                .last_award_at
                .map_or(true, |last| now.saturating_duration_since(last) >= self.config.award_gap());

            if due {
                awarded = self.config.award_points;
                state.accrued_points = state.accrued_points.saturating_add(awarded);
                state.last_award_at = Some(now);
                debug!("Awarded {} points (total {})", awarded, state.accrued_points);
            }
        }

        TickOutcome::Scored {
            lane_state: state.lane_state,
            awarded,
        }
    }

    /// A tick that produced no lane count at all. It breaks the dwell the
    /// same way a non-qualifying count does.
    pub fn miss(&self, state: &mut ScoringState) -> TickOutcome {
        if !state.is_live {
            return TickOutcome::NotLive;
        }
        if state.lane_state != LaneState::OutOfLane {
            debug!("No lane count this tick, dwell reset");
        }
        state.interrupt();
        TickOutcome::Scored {
            lane_state: LaneState::OutOfLane,
            awarded: 0,
        }
    }
}

impl Default for LaneKeepingScorer {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }
}
