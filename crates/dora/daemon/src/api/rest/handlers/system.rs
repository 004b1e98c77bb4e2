//! Daemon liveness handler.

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Response body for health checks.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Report daemon liveness.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}
