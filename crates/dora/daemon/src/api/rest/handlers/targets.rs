//! Target update handler.

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use dora_types::Targets;
use serde::Serialize;

/// Response body for target updates.
#[derive(Debug, Serialize)]
pub struct TargetsAck {
    pub status: String,
}

/// Upsert per-service metric targets.
///
/// Takes effect on the next scorecard read; nothing is recomputed here.
pub async fn update_targets(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Json(targets): Json<Targets>,
) -> ApiResult<Json<TargetsAck>> {
    state
        .scorecard
        .update_targets(&service, targets)
        .await
        .map_err(|err| {
            tracing::error!(service = %service, error = %err, "target update failed");
            ApiError::from(err)
        })?;

    Ok(Json(TargetsAck {
        status: "ok".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::handlers::{get_scorecard, ScorecardQuery};
    use axum::extract::Query;
    use dora_scorecard::ScorecardService;
    use dora_store::InMemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn updated_targets_show_on_next_read() {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(Arc::new(ScorecardService::new(store, Targets::default())));

        let payload = Targets {
            deployment_frequency: 2.0,
            lead_time: 96.0,
            change_failure_rate: 12.0,
            mttr: 480.0,
        };
        let Json(ack) = update_targets(
            State(state.clone()),
            Path("orders".to_string()),
            Json(payload),
        )
        .await
        .unwrap();
        assert_eq!(ack.status, "ok");

        let Json(card) = get_scorecard(
            State(state),
            Path("orders".to_string()),
            Query(ScorecardQuery { days: 7 }),
        )
        .await
        .unwrap();
        assert_eq!(card.metrics.deployment_frequency.target, 2.0);
        assert_eq!(card.metrics.mttr.target, 480.0);
    }
}
