//! Core domain types for the DORA scorecard service.
//!
//! Everything here is pure data plus the tiering and scoring arithmetic:
//! no I/O, no clocks, no storage. The collector, store, and scorecard
//! crates all build on these types.

pub mod events;
pub mod identity;
pub mod metrics;
pub mod scorecard;
pub mod tier;

pub use events::{
    DeploymentConclusion, DeploymentRecord, IssueRecord, PullRequestRecord, RawBatch,
};
pub use identity::{entity_ref, CatalogService, RepoCoordinate, RepoParseError};
pub use metrics::{DailyMetricRow, DailyMetrics, PeriodAggregate, Targets};
pub use scorecard::{MetricSnapshot, Scorecard, ScorecardMetrics};
pub use tier::{overall_score, overall_tier, Metric, Tier};
