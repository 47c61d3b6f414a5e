//! User alerts

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Default number of alerts kept on the board
pub const DEFAULT_CAPACITY: usize = 50;

/// Alert kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Points could not be committed
    CommitFailed,
}

/// Alert shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct UserAlert {
    pub id: u64,
    pub kind: AlertKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Sink for user-visible alerts
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: AlertKind, message: String);
}

/// Bounded in-memory alert list, newest last
pub struct AlertBoard {
    alerts: Mutex<VecDeque<UserAlert>>,
    capacity: usize,
    next_id: AtomicU64,
}

impl AlertBoard {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            alerts: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the current alerts
    pub fn alerts(&self) -> Vec<UserAlert> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AlertBoard {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for AlertBoard {
    fn notify(&self, kind: AlertKind, message: String) {
        warn!("User alert ({:?}): {}", kind, message);

        let alert = UserAlert {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            message,
            raised_at: Utc::now(),
        };

        let mut alerts = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        if alerts.len() == self.capacity {
            alerts.pop_front();
        }
        alerts.push_back(alert);
    }
}
