//! REST API: router, shared state, and handlers.

mod handlers;
mod router;
mod state;

pub use router::create_router;
pub use state::AppState;
