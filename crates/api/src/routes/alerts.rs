//! Alert Routes

use axum::{extract::State, Json};
use reconciler::UserAlert;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<UserAlert>,
    pub count: usize,
}

/// Get user alerts, oldest first
pub async fn get_alerts(State(state): State<Arc<AppState>>) -> Json<AlertResponse> {
    let alerts = state.alerts.alerts();

    Json(AlertResponse {
        count: alerts.len(),
        data: alerts,
    })
}
