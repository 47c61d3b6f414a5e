//! Session Routes
//!
//! Stand-in for the login screen's post-login storage: the dashboard hands
//! over the token and user the backend returned.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use storage::SessionUser;
use tracing::info;

use crate::{ApiError, AppState};

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub access_token: String,
    pub user: SessionUser,
}

/// Cache the token and session user
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionUser>, ApiError> {
    state.store.set_access_token(request.access_token)?;
    state.store.set_session_user(request.user.clone())?;

    info!("Session user {} logged in", request.user.id);
    Ok(Json(request.user))
}

/// Forget token and session user
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.store.logout()?;
    info!("Session user logged out");
    Ok(StatusCode::NO_CONTENT)
}
