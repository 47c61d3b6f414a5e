//! SafeDrive Backend Client
//!
//! HTTP calls the live lane-overlay core depends on:
//! - Lane overlay inference (annotated JPEG + lane-indicator count)
//! - Depth inference (per-pixel distance grid)
//! - Point crediting
//! - Red-line timestamps and driving video upload for recorded sessions
//!
//! Every call carries the stored bearer token when there is one.

mod client;
mod depth;
mod overlay;
mod records;

pub use client::BackendClient;
pub use depth::DepthResult;
pub use overlay::OverlayResult;
pub use records::DrivingSession;

use async_trait::async_trait;
use camera_capture::CaptureFrame;
use serde::Deserialize;
use std::path::Path;
use storage::ArtifactId;
use thiserror::Error;

/// Errors from the overlay and depth inference endpoints
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteInferenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Inference timeout after {0}ms")]
    Timeout(u64),
}

/// Errors committing points to the user
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommitError {
    #[error("No user is logged in")]
    NotLoggedIn,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Local state error: {0}")]
    LocalState(String),
}

/// Errors from the remaining backend calls
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unsupported video format: {0}")]
    UnsupportedFormat(String),

    #[error("File error: {0}")]
    Io(String),
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend base URL
    pub base_url: String,
    /// Lane overlay inference path
    pub overlay_path: String,
    /// Depth inference path
    pub depth_path: String,
    /// Point crediting path
    pub commit_points_path: String,
    /// Driving records path
    pub drive_records_path: String,
    /// Response header carrying the lane-indicator count
    pub lane_count_header: String,
    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            overlay_path: "/lane_overlay/".to_string(),
            depth_path: "/depth/".to_string(),
            commit_points_path: "/add_points/".to_string(),
            drive_records_path: "/drive_records/".to_string(),
            lane_count_header: "x-lane-count".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

impl ApiConfig {
    /// Join the base URL and an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Remote lane-overlay inference
#[async_trait]
pub trait OverlayInference: Send + Sync {
    async fn infer_overlay(&self, frame: &CaptureFrame) -> Result<OverlayResult, RemoteInferenceError>;
}

/// Remote depth inference
#[async_trait]
pub trait DepthInference: Send + Sync {
    async fn infer_depth(&self, frame: &CaptureFrame) -> Result<DepthResult, RemoteInferenceError>;
}

/// Remote "add points to user"
#[async_trait]
pub trait PointsLedger: Send + Sync {
    async fn add_points(&self, user_id: i64, points: u32) -> Result<(), CommitError>;
}

/// Remote red-line timestamps of a converted recording
#[async_trait]
pub trait RedLineSource: Send + Sync {
    async fn red_line_timestamps(&self, artifact: &ArtifactId) -> Result<Vec<f64>, RequestError>;
}

/// Upload of a recorded driving video; the returned session names the
/// artifact that recorded playback scores
#[async_trait]
pub trait DriveRecordUploader: Send + Sync {
    async fn upload_drive_record(
        &self,
        user_id: i64,
        video: &Path,
    ) -> Result<DrivingSession, RequestError>;
}
