//! Capture Loop Scheduler

use crate::session::{Half, LiveSession, LiveView, TickTag};
use crate::{LoopConfig, LoopError};
use backend_client::{DepthInference, OverlayInference, RemoteInferenceError};
use camera_capture::FrameSource;
use lane_scoring::{EpisodeTotal, LaneKeepingScorer, ScoringConfig};
use proximity::{ProximityConfig, ProximityMonitor};
use reconciler::{CommitOutcome, SessionReconciler};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Collaborators the loop drives
pub struct CaptureServices {
    pub source: Arc<dyn FrameSource>,
    pub overlay: Arc<dyn OverlayInference>,
    pub depth: Arc<dyn DepthInference>,
    pub reconciler: Arc<SessionReconciler>,
}

struct LoopInner {
    config: LoopConfig,
    scorer: LaneKeepingScorer,
    services: CaptureServices,
    session: Mutex<LiveSession>,
    view_tx: watch::Sender<LiveView>,
}

impl LoopInner {
    fn session(&self) -> MutexGuard<'_, LiveSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the session and publish the resulting view
    fn update<T>(&self, f: impl FnOnce(&mut LiveSession) -> T) -> T {
        let (out, view) = {
            let mut session = self.session();
            let out = f(&mut session);
            (out, session.view())
        };
        self.view_tx.send_replace(view);
        out
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteInferenceError>>,
    ) -> Result<T, RemoteInferenceError> {
        let limit = self.config.inference_timeout();
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(RemoteInferenceError::Timeout(self.config.inference_timeout_ms)))
    }

    /// One capture cycle. Every failure is logged and swallowed.
    async fn tick(&self, tag: TickTag, now: Instant) {
        let frame = match self.services.source.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Tick {}: capture failed: {}", tag.sequence, e);
                self.update(|s| s.record_capture_failure(tag, &self.scorer));
                return;
            }
        };
        debug!("Tick {}: captured frame {} ({} bytes)", tag.sequence, frame.sequence, frame.len());

        let overlay_half = async {
            match self.with_timeout(self.services.overlay.infer_overlay(&frame)).await {
                Ok(result) => {
                    self.update(|s| s.apply_overlay(tag, result, &self.scorer, now));
                }
                Err(e) => {
                    debug!("Tick {}: overlay inference failed: {}", tag.sequence, e);
                    self.update(|s| s.record_failure(tag, Half::Overlay, &self.scorer));
                }
            }
        };

        let depth_half = async {
            match self.with_timeout(self.services.depth.infer_depth(&frame)).await {
                Ok(result) => {
                    self.update(|s| s.apply_depth(tag, &result));
                }
                Err(e) => {
                    debug!("Tick {}: depth inference failed: {}", tag.sequence, e);
                    self.update(|s| s.record_failure(tag, Half::Depth, &self.scorer));
                }
            }
        };

        tokio::join!(overlay_half, depth_half);
    }

    /// Tick until the generation is superseded. Ticks run inline, so a slow
    /// tick delays the next one and missed ticks are skipped.
    async fn run(self: Arc<Self>, generation: u64) {
        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut sequence = 0;
        loop {
            let now = interval.tick().await;
            sequence += 1;
            let tag = TickTag { generation, sequence };

            if !self.update(|s| s.record_tick(tag, now)) {
                break;
            }
            self.tick(tag, now).await;
        }
        debug!("Capture loop for generation {} exited", generation);
    }
}

/// Live-mode capture loop
pub struct CaptureLoop {
    inner: Arc<LoopInner>,
    /// Running loop task; the lock also serializes start and stop
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl CaptureLoop {
    pub fn new(
        config: LoopConfig,
        scoring: ScoringConfig,
        proximity: ProximityConfig,
        services: CaptureServices,
    ) -> Result<Self, LoopError> {
        config.validate()?;
        let scorer = LaneKeepingScorer::new(scoring).map_err(|e| LoopError::Config(e.to_string()))?;
        let monitor = ProximityMonitor::new(proximity).map_err(|e| LoopError::Config(e.to_string()))?;

        let session = LiveSession::new(monitor);
        let (view_tx, _) = watch::channel(session.view());

        info!(
            "Capture loop created: tick {}ms, inference timeout {}ms",
            config.tick_interval_ms, config.inference_timeout_ms
        );

        Ok(Self {
            inner: Arc::new(LoopInner {
                config,
                scorer,
                services,
                session: Mutex::new(session),
                view_tx,
            }),
            task: tokio::sync::Mutex::new(None),
        })
    }

    /// Turn Live mode on.
    ///
    /// Returns `Ok(false)` when already live. A frame source that is not
    /// ready (e.g. camera permission denied) blocks the start.
    pub async fn start(&self) -> Result<bool, LoopError> {
        let mut task = self.task.lock().await;
        if self.is_live() {
            debug!("Start ignored, already live");
            return Ok(false);
        }

        self.inner.services.source.ensure_ready().await?;

        let generation = self.inner.update(|s| s.begin(Instant::now()));
        let episode = self.inner.session().scoring().episode;
        if let Some(episode) = episode {
            info!("Live mode on, episode {}", episode);
        }

        *task = Some(tokio::spawn(self.inner.clone().run(generation)));
        Ok(true)
    }

    /// Turn Live mode off and take the episode's points.
    ///
    /// The generation is bumped before this returns, so results of a tick
    /// still in flight are discarded. `None` when not live. Callers outside
    /// the crate go through [`CaptureLoop::stop_and_commit`].
    pub(crate) async fn stop(&self) -> Option<EpisodeTotal> {
        let mut task = self.task.lock().await;
        let handle = task.take();

        let total = self.inner.update(|s| s.is_live().then(|| s.end()));
        if let Some(handle) = handle {
            handle.abort();
        }

        if let Some(total) = &total {
            info!("Live mode off, {} points accrued", total.points);
        }
        total
    }

    /// Stop and commit the accrued points once
    pub async fn stop_and_commit(&self) -> CommitOutcome {
        match self.stop().await {
            Some(total) => {
                self.inner
                    .services
                    .reconciler
                    .commit_episode_total(total)
                    .await
            }
            None => CommitOutcome::NothingToCommit,
        }
    }

    pub fn is_live(&self) -> bool {
        self.inner.session().is_live()
    }

    /// Latest published view
    pub fn view(&self) -> LiveView {
        self.inner.view_tx.borrow().clone()
    }

    /// Receive a new view after every state change
    pub fn subscribe(&self) -> watch::Receiver<LiveView> {
        self.inner.view_tx.subscribe()
    }

    pub fn tick_interval(&self) -> Duration {
        self.inner.config.tick_interval()
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
