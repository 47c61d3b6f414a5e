//! Lane-Keeping Scoring
//!
//! Turns the temporal pattern of lane-indicator counts into points:
//! - Live episodes: dwell/hysteresis state machine over 1 Hz overlay results
//! - Recorded sessions: red-line marks crossed during the first playback

pub mod config;
pub mod recorded;
pub mod scorer;
pub mod state;

pub use config::ScoringConfig;
pub use recorded::RecordedSessionScore;
pub use scorer::{LaneKeepingScorer, TickOutcome};
pub use state::{EpisodeId, EpisodeTotal, LaneState, ScoringState};

use thiserror::Error;

/// Scoring error types
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid scoring configuration: {0}")]
    InvalidConfig(String),
}
