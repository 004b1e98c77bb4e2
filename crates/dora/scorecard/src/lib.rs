//! Rolling-window DORA scorecard computation.
//!
//! Reads aggregated daily rows from the store, compares the current
//! window against the preceding one, assigns tiers, and produces the
//! composite scorecard served over HTTP.

mod service;

pub use service::{ScorecardError, ScorecardService};
