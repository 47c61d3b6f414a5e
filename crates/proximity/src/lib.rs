//! Proximity Indicator
//!
//! Samples the median distance of a small region of each depth grid, smooths
//! it over the last few samples and maps the result to a colour-coded
//! proximity class.

mod roi;
mod smoother;

pub use roi::RegionOfInterest;
pub use smoother::{DepthSmoother, DEFAULT_WINDOW};

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Proximity error types
#[derive(Error, Debug)]
pub enum ProximityError {
    #[error("Invalid proximity configuration: {0}")]
    InvalidConfig(String),
}

/// Proximity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Region-of-interest side length (cells)
    pub roi_size: usize,
    /// Region centre offset from the grid centre
    pub roi_row_offset: i64,
    pub roi_col_offset: i64,
    /// Smoothing window (samples)
    pub window: usize,
    /// Below this distance (metres) the class is `Near`
    pub near_m: f32,
    /// Below this distance (metres) the class is `Caution`
    pub caution_m: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            roi_size: 10,
            roi_row_offset: 0,
            roi_col_offset: 0,
            window: DEFAULT_WINDOW,
            near_m: 5.0,
            caution_m: 10.0,
        }
    }
}

impl ProximityConfig {
    pub fn validate(&self) -> Result<(), ProximityError> {
        if self.roi_size == 0 || self.window == 0 {
            return Err(ProximityError::InvalidConfig(
                "roi_size and window must be at least 1".to_string(),
            ));
        }
        if !(self.near_m >= 0.0 && self.near_m <= self.caution_m) {
            return Err(ProximityError::InvalidConfig(format!(
                "near_m ({}) must be between 0 and caution_m ({})",
                self.near_m, self.caution_m
            )));
        }
        Ok(())
    }

    pub fn region(&self) -> RegionOfInterest {
        RegionOfInterest::new(self.roi_size, self.roi_row_offset, self.roi_col_offset)
    }
}

/// Proximity class of the smoothed distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proximity {
    Near,
    Caution,
    Clear,
}

impl Proximity {
    pub fn classify(distance_m: f32, config: &ProximityConfig) -> Self {
        if distance_m < config.near_m {
            Proximity::Near
        } else if distance_m < config.caution_m {
            Proximity::Caution
        } else {
            Proximity::Clear
        }
    }

    /// Indicator colour
    pub fn colour(&self) -> &'static str {
        match self {
            Proximity::Near => "red",
            Proximity::Caution => "amber",
            Proximity::Clear => "green",
        }
    }
}

/// Smoothed distance and its class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityReading {
    pub distance_m: f32,
    pub proximity: Proximity,
}

/// Region sampling plus smoothing for successive depth grids
#[derive(Debug, Clone)]
pub struct ProximityMonitor {
    config: ProximityConfig,
    region: RegionOfInterest,
    smoother: DepthSmoother,
}

impl ProximityMonitor {
    pub fn new(config: ProximityConfig) -> Result<Self, ProximityError> {
        config.validate()?;
        Ok(Self {
            region: config.region(),
            smoother: DepthSmoother::new(config.window),
            config,
        })
    }

    /// Feed one depth grid.
    ///
    /// A grid with no valid cells in the region leaves the smoother untouched
    /// and the previous reading (if any) is returned.
    pub fn observe(&mut self, grid: ArrayView2<'_, f32>) -> Option<ProximityReading> {
        match self.region.median(grid) {
            Some(sample) => {
                let distance_m = self.smoother.update(sample);
                Some(self.reading(distance_m))
            }
            None => {
                debug!(
                    "No valid depth cells in {}x{} grid, keeping previous distance",
                    grid.nrows(),
                    grid.ncols()
                );
                self.current()
            }
        }
    }

    pub fn current(&self) -> Option<ProximityReading> {
        self.smoother.mean().map(|d| self.reading(d))
    }

    pub fn reset(&mut self) {
        self.smoother.clear();
    }

    fn reading(&self, distance_m: f32) -> ProximityReading {
        ProximityReading {
            distance_m,
            proximity: Proximity::classify(distance_m, &self.config),
        }
    }
}

impl Default for ProximityMonitor {
    fn default() -> Self {
        let config = ProximityConfig::default();
        Self {
            region: config.region(),
            smoother: DepthSmoother::new(config.window),
            config,
        }
    }
}
