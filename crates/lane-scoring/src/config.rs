//! Scoring configuration

use crate::ScoringError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lane-keeping scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Lane-indicator count that means "correctly positioned"
    pub qualifying_count: u32,

    /// Continuous correct positioning required before awards (milliseconds)
    pub dwell_ms: u64,

    /// Minimum gap between two awards (milliseconds)
    pub award_gap_ms: u64,

    /// Points per award
    pub award_points: u32,

    /// Half-width of the window around a recorded red-line mark (milliseconds)
    pub recorded_tolerance_ms: u64,

    /// Points per red-line mark crossed during the first playback
    pub recorded_points: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            qualifying_count: 2,
            dwell_ms: 2000,
            award_gap_ms: 2000,
            award_points: 3,
            recorded_tolerance_ms: 250,
            recorded_points: 3,
        }
    }
}

impl ScoringConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn award_gap(&self) -> Duration {
        Duration::from_millis(self.award_gap_ms)
    }

    /// Reject configurations the scorer cannot work with
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.qualifying_count == 0 {
            return Err(ScoringError::InvalidConfig(
                "qualifying_count must be at least 1".to_string(),
            ));
        }
        if self.award_points == 0 || self.recorded_points == 0 {
            return Err(ScoringError::InvalidConfig(
                "award increments must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
