//! Recorded Playback Routes
//!
//! A converted recording is scored during its first local playback. The
//! player reports positions and the end of playback; the points are
//! committed once per artifact.

use axum::{
    extract::{Path, State},
    Json,
};
use backend_client::{DrivingSession, RequestError};
use lane_scoring::RecordedSessionScore;
use reconciler::CommitOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, MutexGuard, PoisonError};
use storage::ArtifactId;
use tracing::info;

use crate::{ApiError, AppState};

type Sessions<'a> = MutexGuard<'a, std::collections::HashMap<ArtifactId, RecordedSessionScore>>;

fn sessions(state: &AppState) -> Sessions<'_> {
    state.recorded.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Upload request: a driving video on local disk
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub path: PathBuf,
}

/// Response for the upload endpoint
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Artifact to open for recorded playback
    pub artifact: ArtifactId,
    pub session: DrivingSession,
}

/// Response for the open endpoint
#[derive(Debug, Serialize)]
pub struct OpenResponse {
    pub artifact: ArtifactId,
    pub red_lines: usize,
}

/// Playback position update
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub seconds: f64,
}

/// Response for the position endpoint
#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub awarded: u32,
    pub points: u32,
}

/// Upload a driving video for the session user and return its artifact
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let user = state
        .store
        .session_user()
        .ok_or_else(|| ApiError::Unauthorized("No user is logged in".to_string()))?;

    let session = state
        .uploader
        .upload_drive_record(user.id, &request.path)
        .await
        .map_err(|e| match e {
            RequestError::UnsupportedFormat(_) | RequestError::Io(_) => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::Upstream(other.to_string()),
        })?;

    let artifact = session.artifact_id();
    info!("Uploaded {} as recording {}", request.path.display(), artifact);
    Ok(Json(UploadResponse { artifact, session }))
}

/// Fetch the red-line marks and begin scoring a recording
pub async fn open(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OpenResponse>, ApiError> {
    let artifact = ArtifactId::new(id);
    if state.store.is_artifact_scored(&artifact) {
        return Err(ApiError::Conflict(format!(
            "Recording {} was already scored",
            artifact
        )));
    }

    let marks = state
        .red_lines
        .red_line_timestamps(&artifact)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let score = RecordedSessionScore::new(&marks, &state.scoring);
    let red_lines = score.red_line_count();
    sessions(&state).insert(artifact.clone(), score);

    info!("Recorded playback of {} opened with {} red lines", artifact, red_lines);
    Ok(Json(OpenResponse {
        artifact,
        red_lines,
    }))
}

/// Report the playback position
pub async fn position(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<PositionRequest>,
) -> Result<Json<PositionResponse>, ApiError> {
    let artifact = ArtifactId::new(id);
    let mut sessions = sessions(&state);
    let score = sessions
        .get_mut(&artifact)
        .ok_or_else(|| ApiError::NotFound(format!("No open playback for {}", artifact)))?;

    let awarded = score.on_position(request.seconds);
    Ok(Json(PositionResponse {
        awarded,
        points: score.points(),
    }))
}

/// Playback finished; commit the recording's points on the first finish.
///
/// The score stays registered so later finishes and positions of the same
/// playback report nothing new.
pub async fn finished(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommitOutcome>, ApiError> {
    let artifact = ArtifactId::new(id);
    let points = {
        let mut sessions = sessions(&state);
        let score = sessions
            .get_mut(&artifact)
            .ok_or_else(|| ApiError::NotFound(format!("No open playback for {}", artifact)))?;
        score.on_playback_finished()
    };

    let outcome = match points {
        Some(points) => {
            state
                .reconciler
                .commit_recorded_episode(&artifact, points)
                .await
        }
        None => CommitOutcome::AlreadyCommitted,
    };
    Ok(Json(outcome))
}
