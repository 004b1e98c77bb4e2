//! Storage trait definitions.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use dora_types::{DailyMetricRow, DailyMetrics, PeriodAggregate, Targets};

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable per-service metric rows and targets.
///
/// Daily rows are keyed by `(entity_ref, date)` and upserts overwrite the
/// whole row, so re-running a sync for any date is safe and last-writer-wins.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Create or overwrite the aggregate row for one day.
    async fn upsert_daily(
        &self,
        entity_ref: &str,
        date: NaiveDate,
        metrics: DailyMetrics,
    ) -> StoreResult<()>;

    /// Summed counts and averaged durations over an inclusive date range.
    ///
    /// An empty range reads as all zeroes; averages cover only the rows
    /// that exist.
    async fn period_aggregate(
        &self,
        entity_ref: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<PeriodAggregate>;

    /// Daily rows over an inclusive date range, ascending by date.
    ///
    /// Sparse: days without a stored row are omitted.
    async fn daily_series(
        &self,
        entity_ref: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<DailyMetricRow>>;

    /// Latest date with a stored row; the collector's resume watermark.
    async fn last_synced_date(&self, entity_ref: &str) -> StoreResult<Option<NaiveDate>>;

    /// Stored targets for a service, if any were ever set.
    async fn targets(&self, entity_ref: &str) -> StoreResult<Option<Targets>>;

    /// Create or overwrite the targets row for a service.
    async fn upsert_targets(&self, entity_ref: &str, targets: Targets) -> StoreResult<()>;
}
