//! SafeDrive Dashboard API
//!
//! Local HTTP surface standing in for the mobile screen: Live mode on/off,
//! the current view and overlay image, recorded playback events, user alerts
//! and the session stand-in for the login screen.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use backend_client::{DriveRecordUploader, RedLineSource};
use capture_loop::CaptureLoop;
use lane_scoring::{RecordedSessionScore, ScoringConfig};
use reconciler::{AlertBoard, SessionReconciler};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use storage::{ArtifactId, LocalStore, StorageError};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod routes;

pub use config::AppConfig;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Backend request failed: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Live-mode capture loop
    pub capture: CaptureLoop,
    /// Local store (token, session user, scored artifacts)
    pub store: Arc<LocalStore>,
    pub red_lines: Arc<dyn RedLineSource>,
    pub uploader: Arc<dyn DriveRecordUploader>,
    pub reconciler: Arc<SessionReconciler>,
    pub alerts: Arc<AlertBoard>,
    pub scoring: ScoringConfig,
    /// Recorded sessions being played back, by artifact
    pub recorded: Mutex<HashMap<ArtifactId, RecordedSessionScore>>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        capture: CaptureLoop,
        store: Arc<LocalStore>,
        red_lines: Arc<dyn RedLineSource>,
        uploader: Arc<dyn DriveRecordUploader>,
        reconciler: Arc<SessionReconciler>,
        alerts: Arc<AlertBoard>,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            capture,
            store,
            red_lines,
            uploader,
            reconciler,
            alerts,
            scoring,
            recorded: Mutex::new(HashMap::new()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub live: bool,
    pub logged_in: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/live", get(routes::live::get_view))
        .route("/api/v1/live/overlay", get(routes::live::get_overlay))
        .route("/api/v1/live/start", post(routes::live::start))
        .route("/api/v1/live/stop", post(routes::live::stop))
        .route("/api/v1/recorded/upload", post(routes::recorded::upload))
        .route("/api/v1/recorded/:id/open", post(routes::recorded::open))
        .route("/api/v1/recorded/:id/position", post(routes::recorded::position))
        .route("/api/v1/recorded/:id/finished", post(routes::recorded::finished))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route(
            "/api/v1/session",
            post(routes::session::login).delete(routes::session::logout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        live: state.capture.is_live(),
        logged_in: state.store.session_user().is_some(),
    })
}

/// Initialize logging at `level` (falls back to INFO when unparsable)
pub fn init_logging(level: &str) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
