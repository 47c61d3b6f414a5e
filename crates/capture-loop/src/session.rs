//! Live session state shared between the loop task and its controller

use backend_client::{DepthResult, OverlayResult};
use lane_scoring::{EpisodeId, EpisodeTotal, LaneKeepingScorer, LaneState, ScoringState};
use proximity::{Proximity, ProximityMonitor};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Identity of one tick's results: episode generation plus tick sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTag {
    pub generation: u64,
    pub sequence: u64,
}

/// Per-episode tick counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickStats {
    pub ticks: u64,
    pub capture_failures: u64,
    pub overlay_failures: u64,
    pub depth_failures: u64,
    /// Results dropped because a newer tick or a new episode superseded them
    pub stale_results: u64,
}

/// Which inference half failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Overlay,
    Depth,
}

/// Snapshot of the live episode for display
#[derive(Debug, Clone, Serialize)]
pub struct LiveView {
    pub live: bool,
    pub episode: Option<EpisodeId>,
    pub points: u32,
    pub lane_state: LaneState,
    pub lane_count: Option<u32>,
    pub distance_m: Option<f32>,
    pub proximity: Option<Proximity>,
    pub proximity_colour: Option<&'static str>,
    /// Elapsed episode time as `mm:ss`
    pub elapsed: String,
    pub elapsed_secs: u64,
    pub stats: TickStats,
    /// Latest annotated overlay (JPEG)
    #[serde(skip)]
    pub overlay: Option<Arc<Vec<u8>>>,
}

/// Format an elapsed duration as `mm:ss`; minutes keep counting past 59
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Everything the tick handler mutates, guarded by one short-held mutex
#[derive(Debug)]
pub struct LiveSession {
    generation: u64,
    scoring: ScoringState,
    proximity: ProximityMonitor,
    overlay: Option<Arc<Vec<u8>>>,
    lane_count: Option<u32>,
    last_overlay_seq: u64,
    last_depth_seq: u64,
    started_at: Option<Instant>,
    elapsed: Duration,
    stats: TickStats,
}

impl LiveSession {
    pub fn new(proximity: ProximityMonitor) -> Self {
        Self {
            generation: 0,
            scoring: ScoringState::default(),
            proximity,
            overlay: None,
            lane_count: None,
            last_overlay_seq: 0,
            last_depth_seq: 0,
            started_at: None,
            elapsed: Duration::ZERO,
            stats: TickStats::default(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.scoring.is_live
    }

    pub fn scoring(&self) -> &ScoringState {
        &self.scoring
    }

    /// Start a new episode and return its generation
    pub fn begin(&mut self, now: Instant) -> u64 {
        self.generation += 1;
        let episode = self.scoring.begin_episode();
        self.proximity.reset();
        self.overlay = None;
        self.lane_count = None;
        self.last_overlay_seq = 0;
        self.last_depth_seq = 0;
        self.started_at = Some(now);
        self.elapsed = Duration::ZERO;
        self.stats = TickStats::default();
        debug!("Episode {} begins as generation {}", episode, self.generation);
        self.generation
    }

    /// Leave live mode, invalidating every in-flight result, and take the points
    pub fn end(&mut self) -> EpisodeTotal {
        self.generation += 1;
        self.scoring.end_episode()
    }

    fn is_current(&self, tag: TickTag) -> bool {
        tag.generation == self.generation && self.scoring.is_live
    }

    /// Count a tick and advance the elapsed clock. Returns `false` once the
    /// generation is no longer current.
    pub fn record_tick(&mut self, tag: TickTag, now: Instant) -> bool {
        if !self.is_current(tag) {
            return false;
        }
        self.stats.ticks += 1;
        if let Some(started) = self.started_at {
            self.elapsed = now.saturating_duration_since(started);
        }
        true
    }

    /// No frame this tick, so no lane count either: the dwell breaks.
    pub fn record_capture_failure(&mut self, tag: TickTag, scorer: &LaneKeepingScorer) {
        if !self.is_current(tag) {
            return;
        }
        self.stats.capture_failures += 1;
        self.miss_overlay(tag, scorer);
    }

    /// Count a failed half. A failed overlay breaks the dwell; the last
    /// overlay image and distance stay on display.
    pub fn record_failure(&mut self, tag: TickTag, half: Half, scorer: &LaneKeepingScorer) {
        if !self.is_current(tag) {
            return;
        }
        match half {
            Half::Overlay => {
                self.stats.overlay_failures += 1;
                self.miss_overlay(tag, scorer);
            }
            Half::Depth => self.stats.depth_failures += 1,
        }
    }

    fn miss_overlay(&mut self, tag: TickTag, scorer: &LaneKeepingScorer) {
        if tag.sequence > self.last_overlay_seq {
            self.last_overlay_seq = tag.sequence;
            scorer.miss(&mut self.scoring);
        }
    }

    /// Apply an overlay result to the scorer. Returns `false` when the result is stale.
    pub fn apply_overlay(
        &mut self,
        tag: TickTag,
        result: OverlayResult,
        scorer: &LaneKeepingScorer,
        now: Instant,
    ) -> bool {
        if !self.is_current(tag) || tag.sequence <= self.last_overlay_seq {
            self.stats.stale_results += u64::from(tag.generation == self.generation);
            debug!("Discarding stale overlay result for tick {}", tag.sequence);
            return false;
        }
        self.last_overlay_seq = tag.sequence;

        let count = result.lane_indicator_count;
        scorer.update(&mut self.scoring, count, now);
        self.lane_count = Some(count);
        self.overlay = Some(Arc::new(result.annotated_image));
        true
    }

    /// Apply a depth result to the smoother. Returns `false` when the result is stale.
    pub fn apply_depth(&mut self, tag: TickTag, result: &DepthResult) -> bool {
        if !self.is_current(tag) || tag.sequence <= self.last_depth_seq {
            self.stats.stale_results += u64::from(tag.generation == self.generation);
            debug!("Discarding stale depth result for tick {}", tag.sequence);
            return false;
        }
        self.last_depth_seq = tag.sequence;
        self.proximity.observe(result.grid.view());
        true
    }

    pub fn view(&self) -> LiveView {
        let reading = self.proximity.current();
        LiveView {
            live: self.scoring.is_live,
            episode: self.scoring.episode,
            points: self.scoring.accrued_points,
            lane_state: self.scoring.lane_state,
            lane_count: self.lane_count,
            distance_m: reading.map(|r| r.distance_m),
            proximity: reading.map(|r| r.proximity),
            proximity_colour: reading.map(|r| r.proximity.colour()),
            elapsed: format_elapsed(self.elapsed),
            elapsed_secs: self.elapsed.as_secs(),
            stats: self.stats,
            overlay: self.overlay.clone(),
        }
    }
}
