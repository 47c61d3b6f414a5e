//! Session Reconciler Implementation

use crate::notifier::{AlertKind, Notifier};
use backend_client::{CommitError, PointsLedger};
use lane_scoring::{EpisodeTotal, ScoringState};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use storage::{ArtifactId, LocalStore};
use tracing::{debug, error, info, warn};

/// What a commit attempt did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed { points: u32 },
    /// Zero points; no remote call
    NothingToCommit,
    /// Artifact already committed; no remote call
    AlreadyCommitted,
    /// The points are lost; the user was alerted
    Failed {
        points: u32,
        #[serde(serialize_with = "display")]
        error: CommitError,
    },
}

fn display<S: Serializer>(err: &CommitError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

/// Commits accrued points to the logged-in user exactly once
pub struct SessionReconciler {
    ledger: Arc<dyn PointsLedger>,
    store: Arc<LocalStore>,
    notifier: Arc<dyn Notifier>,
}

impl SessionReconciler {
    pub fn new(
        ledger: Arc<dyn PointsLedger>,
        store: Arc<LocalStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ledger,
            store,
            notifier,
        }
    }

    /// End the live episode held in `state` and commit its points.
    ///
    /// The points leave `state` before any remote call, so calling this again
    /// on the same state finds nothing to commit.
    pub async fn commit_live_episode(&self, state: &mut ScoringState) -> CommitOutcome {
        let total = state.end_episode();
        self.commit_episode_total(total).await
    }

    /// Commit points already taken out of a live episode
    pub async fn commit_episode_total(&self, total: EpisodeTotal) -> CommitOutcome {
        match total.episode {
            Some(episode) => info!("Live episode {} ended with {} points", episode, total.points),
            None => debug!("No live episode to end"),
        }
        self.commit_points(total.points).await
    }

    /// Commit the points of a recorded artifact at most once.
    ///
    /// The artifact is recorded as committed before the remote call,
    /// whatever its outcome.
    pub async fn commit_recorded_episode(&self, artifact: &ArtifactId, points: u32) -> CommitOutcome {
        if self.store.is_artifact_scored(artifact) {
            debug!("Artifact {} already committed", artifact);
            return CommitOutcome::AlreadyCommitted;
        }

        match self.store.mark_artifact_scored(artifact.clone()) {
            Ok(true) => {}
            Ok(false) => return CommitOutcome::AlreadyCommitted,
            Err(e) => {
                let error = CommitError::LocalState(e.to_string());
                return self.fail(points, error);
            }
        }

        info!("Recorded artifact {} scored {} points", artifact, points);
        self.commit_points(points).await
    }

    async fn commit_points(&self, points: u32) -> CommitOutcome {
        if points == 0 {
            return CommitOutcome::NothingToCommit;
        }

        let Some(user) = self.store.session_user() else {
            return self.fail(points, CommitError::NotLoggedIn);
        };

        match self.ledger.add_points(user.id, points).await {
            Ok(()) => {
                if let Err(e) = self.store.credit_session_user(points) {
                    warn!("Committed points but could not update cached user: {}", e);
                }
                info!("Committed {} points to user {}", points, user.id);
                CommitOutcome::Committed { points }
            }
            Err(e) => self.fail(points, e),
        }
    }

    fn fail(&self, points: u32, error: CommitError) -> CommitOutcome {
        error!("Failed to commit {} points: {}", points, error);
        self.notifier.notify(
            AlertKind::CommitFailed,
            format!("Could not add {} points to your balance: {}", points, error),
        );
        CommitOutcome::Failed { points, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlertBoard;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storage::SessionUser;

    /// Ledger recording every call; fails when `fail` is set
    #[derive(Default)]
    struct MockLedger {
        calls: Mutex<Vec<(i64, u32)>>,
        fail: bool,
    }

    #[async_trait]
    impl PointsLedger for MockLedger {
        async fn add_points(&self, user_id: i64, points: u32) -> Result<(), CommitError> {
            self.calls.lock().unwrap().push((user_id, points));
            if self.fail {
                Err(CommitError::Network("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        ledger: Arc<MockLedger>,
        store: Arc<LocalStore>,
        board: Arc<AlertBoard>,
        reconciler: SessionReconciler,
    }

    fn harness(fail: bool, logged_in: bool) -> Harness {
        let ledger = Arc::new(MockLedger {
            fail,
            ..Default::default()
        });
        let store = Arc::new(LocalStore::in_memory());
        if logged_in {
            store
                .set_session_user(SessionUser {
                    id: 7,
                    firstname: "Sam".to_string(),
                    points: 100,
                })
                .unwrap();
        }
        let board = Arc::new(AlertBoard::default());
        let reconciler = SessionReconciler::new(ledger.clone(), store.clone(), board.clone());
        Harness {
            ledger,
            store,
            board,
            reconciler,
        }
    }

    fn episode_with(points: u32) -> ScoringState {
        let mut state = ScoringState::default();
        state.begin_episode();
        state.accrued_points = points;
        state
    }

    #[tokio::test]
    async fn test_live_commit_once() {
        let h = harness(false, true);
        let mut state = episode_with(6);

        let first = h.reconciler.commit_live_episode(&mut state).await;
        assert_eq!(first, CommitOutcome::Committed { points: 6 });
        assert_eq!(state.accrued_points, 0);
        assert!(!state.is_live);

        let second = h.reconciler.commit_live_episode(&mut state).await;
        assert_eq!(second, CommitOutcome::NothingToCommit);

        assert_eq!(h.ledger.calls.lock().unwrap().clone(), vec![(7, 6)]);
        assert_eq!(h.store.session_user().unwrap().points, 106);
        assert!(h.board.is_empty());
    }

    #[tokio::test]
    async fn test_live_commit_failure_resets_and_alerts_once() {
        let h = harness(true, true);
        let mut state = episode_with(9);

        let outcome = h.reconciler.commit_live_episode(&mut state).await;
        assert!(matches!(outcome, CommitOutcome::Failed { points: 9, .. }));
        assert_eq!(state.accrued_points, 0);

        h.reconciler.commit_live_episode(&mut state).await;

        assert_eq!(h.ledger.calls.lock().unwrap().len(), 1);
        assert_eq!(h.board.len(), 1);
        assert_eq!(h.store.session_user().unwrap().points, 100);
    }

    #[tokio::test]
    async fn test_zero_points_no_remote_call() {
        let h = harness(false, true);
        let mut state = episode_with(0);

        assert_eq!(
            h.reconciler.commit_live_episode(&mut state).await,
            CommitOutcome::NothingToCommit
        );
        assert!(h.ledger.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_logged_in() {
        let h = harness(false, false);
        let mut state = episode_with(3);

        let outcome = h.reconciler.commit_live_episode(&mut state).await;
        assert_eq!(
            outcome,
            CommitOutcome::Failed {
                points: 3,
                error: CommitError::NotLoggedIn
            }
        );
        assert!(h.ledger.calls.lock().unwrap().is_empty());
        assert_eq!(h.board.len(), 1);
    }

    #[tokio::test]
    async fn test_recorded_commit_once_per_artifact() {
        let h = harness(false, true);
        let artifact = ArtifactId::from(12);

        let first = h.reconciler.commit_recorded_episode(&artifact, 9).await;
        let second = h.reconciler.commit_recorded_episode(&artifact, 9).await;

        assert_eq!(first, CommitOutcome::Committed { points: 9 });
        assert_eq!(second, CommitOutcome::AlreadyCommitted);
        assert_eq!(h.ledger.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recorded_marked_even_when_commit_fails() {
        let h = harness(true, true);
        let artifact = ArtifactId::from(13);

        let outcome = h.reconciler.commit_recorded_episode(&artifact, 3).await;
        assert!(matches!(outcome, CommitOutcome::Failed { .. }));
        assert!(h.store.is_artifact_scored(&artifact));

        assert_eq!(
            h.reconciler.commit_recorded_episode(&artifact, 3).await,
            CommitOutcome::AlreadyCommitted
        );
        assert_eq!(h.ledger.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_point_artifact_still_marked() {
        let h = harness(false, true);
        let artifact = ArtifactId::from(14);

        assert_eq!(
            h.reconciler.commit_recorded_episode(&artifact, 0).await,
            CommitOutcome::NothingToCommit
        );
        assert!(h.store.is_artifact_scored(&artifact));
    }

    #[test]
    fn test_outcome_serialization() {
        let failed = CommitOutcome::Failed {
            points: 3,
            error: CommitError::NotLoggedIn,
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "No user is logged in");

        let json = serde_json::to_value(CommitOutcome::Committed { points: 6 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "committed", "points": 6}));
    }
}
