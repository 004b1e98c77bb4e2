//! API router configuration.

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router.
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/scorecard/:service", get(handlers::get_scorecard))
        .route("/targets/:service", post(handlers::update_targets))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
