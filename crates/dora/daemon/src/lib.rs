//! DORA scorecard daemon library.
//!
//! Wires the collector, store, and scorecard service together behind a
//! REST API:
//! - `GET /scorecard/:service?days=N` serves the rolling-window scorecard
//! - `POST /targets/:service` updates per-service targets
//! - `GET /health` reports daemon liveness

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
