//! Scorecard read handler.

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use dora_types::Scorecard;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ScorecardQuery {
    /// Rolling window length in days.
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    30
}

/// Serve the rolling-window scorecard for one service.
pub async fn get_scorecard(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<ScorecardQuery>,
) -> ApiResult<Json<Scorecard>> {
    let scorecard = state
        .scorecard
        .scorecard(&service, query.days)
        .await
        .map_err(|err| {
            tracing::error!(service = %service, error = %err, "scorecard computation failed");
            ApiError::from(err)
        })?;

    Ok(Json(scorecard))
}
