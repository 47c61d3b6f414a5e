//! Session Reconciler
//!
//! Commits accrued points to the logged-in user's balance: once per live
//! episode and once per recorded artifact. Failed commits are not retried;
//! the user gets one alert.

mod notifier;
mod reconciler;

pub use notifier::{AlertBoard, AlertKind, Notifier, UserAlert};
pub use reconciler::{CommitOutcome, SessionReconciler};
