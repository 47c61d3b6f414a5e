//! Recorded-session scoring
//!
//! A converted recording carries red-line timestamps. During the first local
//! playback every mark the playhead passes within the tolerance window
//! credits once; after playback finishes nothing accrues any more.

use crate::ScoringConfig;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Score of one recorded artifact
#[derive(Debug, Clone)]
pub struct RecordedSessionScore {
    /// Red-line marks (milliseconds)
    red_lines_ms: BTreeSet<u64>,
    /// Marks already credited
    credited_ms: BTreeSet<u64>,
    has_played_once: bool,
    points: u32,
    tolerance_ms: u64,
    points_per_mark: u32,
}

impl RecordedSessionScore {
    /// Build from red-line timestamps in seconds; negative or non-finite values are dropped
    pub fn new(timestamps: &[f64], config: &ScoringConfig) -> Self {
        let red_lines_ms: BTreeSet<u64> = timestamps
            .iter()
            .filter_map(|&s| seconds_to_ms(s))
            .collect();

        if red_lines_ms.len() != timestamps.len() {
            warn!(
                "Dropped {} invalid or duplicate red-line timestamps",
                timestamps.len() - red_lines_ms.len()
            );
        }

        Self {
            red_lines_ms,
            credited_ms: BTreeSet::new(),
            has_played_once: false,
            points: 0,
            tolerance_ms: config.recorded_tolerance_ms,
            points_per_mark: config.recorded_points,
        }
    }

    /// Playback position update; returns the points awarded by this update
    pub fn on_position(&mut self, seconds: f64) -> u32 {
        if self.has_played_once {
            return 0;
        }
        let Some(position) = seconds_to_ms(seconds) else {
            return 0;
        };

        let low = position.saturating_sub(self.tolerance_ms);
        let high = position.saturating_add(self.tolerance_ms);
        let mark = self
            .red_lines_ms
            .range(low..=high)
            .find(|m| !self.credited_ms.contains(m))
            .copied();

        match mark {
            Some(mark) => {
                self.credited_ms.insert(mark);
                self.points = self.points.saturating_add(self.points_per_mark);
                debug!(
                    "Red line at {}ms crossed at {}ms, recorded points {}",
                    mark, position, self.points
                );
                self.points_per_mark
            }
            None => 0,
        }
    }

    /// First playback finished. Returns the points to commit the first time only.
    pub fn on_playback_finished(&mut self) -> Option<u32> {
        if self.has_played_once {
            return None;
        }
        self.has_played_once = true;
        info!(
            "Recorded playback finished: {} of {} red lines, {} points",
            self.credited_ms.len(),
            self.red_lines_ms.len(),
            self.points
        );
        Some(self.points)
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn has_played_once(&self) -> bool {
        self.has_played_once
    }

    pub fn red_line_count(&self) -> usize {
        self.red_lines_ms.len()
    }

    pub fn credited_count(&self) -> usize {
        self.credited_ms.len()
    }
}

fn seconds_to_ms(seconds: f64) -> Option<u64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Some((seconds * 1000.0).round() as u64)
    } else {
        None
    }
}
