//! Live Mode Routes

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use capture_loop::{LiveView, LoopError};
use reconciler::CommitOutcome;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{ApiError, AppState};

/// Response for the start endpoint
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// `false` when Live mode was already on
    pub started: bool,
    pub view: LiveView,
}

/// Current live view
pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<LiveView> {
    Json(state.capture.view())
}

/// Latest annotated overlay image
pub async fn get_overlay(State(state): State<Arc<AppState>>) -> Response {
    match state.capture.view().overlay {
        Some(jpeg) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg.as_ref().clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Turn Live mode on
pub async fn start(State(state): State<Arc<AppState>>) -> Result<Json<StartResponse>, ApiError> {
    let started = state.capture.start().await.map_err(|e| match e {
        LoopError::Capture(e) => ApiError::Conflict(format!("Camera not available: {}", e)),
        LoopError::Config(e) => ApiError::Internal(e),
    })?;

    Ok(Json(StartResponse {
        started,
        view: state.capture.view(),
    }))
}

/// Turn Live mode off and commit the episode's points
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<CommitOutcome> {
    let outcome = state.capture.stop_and_commit().await;
    info!("Live stop via dashboard: {:?}", outcome);
    Json(outcome)
}
