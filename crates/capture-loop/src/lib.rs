//! Live Capture Loop
//!
//! Drives Live mode: one capture tick per interval, overlay and depth
//! inference in parallel within the tick, scorer and smoother updates as each
//! result lands, and a published view for the display. Results of a stopped
//! episode or an older tick are discarded.

mod scheduler;
mod session;

pub use scheduler::{CaptureLoop, CaptureServices};
pub use session::{format_elapsed, Half, LiveSession, LiveView, TickStats, TickTag};

use camera_capture::CaptureError;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Capture loop error types
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Frame source not ready: {0}")]
    Capture(#[from] CaptureError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Capture loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Capture cadence (milliseconds)
    pub tick_interval_ms: u64,
    /// Bound on each inference call (milliseconds)
    pub inference_timeout_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            inference_timeout_ms: 1000,
        }
    }
}

impl LoopConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), LoopError> {
        if self.tick_interval_ms == 0 || self.inference_timeout_ms == 0 {
            return Err(LoopError::Config(
                "tick_interval_ms and inference_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
