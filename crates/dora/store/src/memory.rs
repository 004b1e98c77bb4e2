//! In-memory storage implementation.

use crate::traits::{MetricsStore, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use dora_types::{DailyMetricRow, DailyMetrics, PeriodAggregate, Targets};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// In-memory store for development and testing.
///
/// Mirrors the SQL backend's semantics: upserts overwrite by
/// `(entity_ref, date)` and window averages cover only existing rows.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    daily: RwLock<HashMap<String, BTreeMap<NaiveDate, DailyMetrics>>>,
    targets: RwLock<HashMap<String, Targets>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    async fn upsert_daily(
        &self,
        entity_ref: &str,
        date: NaiveDate,
        metrics: DailyMetrics,
    ) -> StoreResult<()> {
        let mut daily = self.daily.write().await;
        daily
            .entry(entity_ref.to_string())
            .or_default()
            .insert(date, metrics);
        Ok(())
    }

    async fn period_aggregate(
        &self,
        entity_ref: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<PeriodAggregate> {
        let daily = self.daily.read().await;
        let mut aggregate = PeriodAggregate::default();
        let Some(rows) = daily.get(entity_ref) else {
            return Ok(aggregate);
        };

        let mut lead_total = 0u64;
        let mut mttr_total = 0u64;
        let mut row_count = 0u64;
        for metrics in rows.range(start..=end).map(|(_, m)| m) {
            aggregate.total_deployments += u64::from(metrics.deployment_count);
            aggregate.total_failures += u64::from(metrics.deployment_failure_count);
            lead_total += u64::from(metrics.lead_time_avg_seconds);
            mttr_total += u64::from(metrics.mttr_avg_seconds);
            row_count += 1;
        }
        if row_count > 0 {
            aggregate.lead_time_avg_seconds = lead_total as f64 / row_count as f64;
            aggregate.mttr_avg_seconds = mttr_total as f64 / row_count as f64;
        }
        Ok(aggregate)
    }

    async fn daily_series(
        &self,
        entity_ref: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<DailyMetricRow>> {
        let daily = self.daily.read().await;
        let Some(rows) = daily.get(entity_ref) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .range(start..=end)
            .map(|(date, metrics)| DailyMetricRow {
                date: *date,
                metrics: *metrics,
            })
            .collect())
    }

    async fn last_synced_date(&self, entity_ref: &str) -> StoreResult<Option<NaiveDate>> {
        let daily = self.daily.read().await;
        Ok(daily
            .get(entity_ref)
            .and_then(|rows| rows.keys().next_back().copied()))
    }

    async fn targets(&self, entity_ref: &str) -> StoreResult<Option<Targets>> {
        let targets = self.targets.read().await;
        Ok(targets.get(entity_ref).copied())
    }

    async fn upsert_targets(&self, entity_ref: &str, targets: Targets) -> StoreResult<()> {
        let mut stored = self.targets.write().await;
        stored.insert(entity_ref.to_string(), targets);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn metrics(deploys: u32, failures: u32, lead: u32, mttr: u32) -> DailyMetrics {
        DailyMetrics {
            deployment_count: deploys,
            deployment_failure_count: failures,
            lead_time_avg_seconds: lead,
            mttr_avg_seconds: mttr,
        }
    }

    #[tokio::test]
    async fn upsert_twice_keeps_one_row() {
        let store = InMemoryStore::new();
        let day = date("2024-01-10");
        store
            .upsert_daily("component:default/orders", day, metrics(2, 1, 100, 0))
            .await
            .unwrap();
        store
            .upsert_daily("component:default/orders", day, metrics(3, 0, 200, 50))
            .await
            .unwrap();

        let rows = store
            .daily_series("component:default/orders", day, day)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metrics, metrics(3, 0, 200, 50));
    }

    #[tokio::test]
    async fn aggregate_sums_counts_and_averages_durations() {
        let store = InMemoryStore::new();
        store
            .upsert_daily("svc", date("2024-01-01"), metrics(4, 1, 3600, 600))
            .await
            .unwrap();
        store
            .upsert_daily("svc", date("2024-01-02"), metrics(6, 0, 7200, 0))
            .await
            .unwrap();
        // Outside the window, must not count.
        store
            .upsert_daily("svc", date("2024-02-01"), metrics(100, 100, 1, 1))
            .await
            .unwrap();

        let aggregate = store
            .period_aggregate("svc", date("2024-01-01"), date("2024-01-31"))
            .await
            .unwrap();
        assert_eq!(aggregate.total_deployments, 10);
        assert_eq!(aggregate.total_failures, 1);
        assert_eq!(aggregate.lead_time_avg_seconds, 5400.0);
        assert_eq!(aggregate.mttr_avg_seconds, 300.0);
    }

    #[tokio::test]
    async fn empty_window_reads_as_zero() {
        let store = InMemoryStore::new();
        let aggregate = store
            .period_aggregate("svc", date("2024-01-01"), date("2024-01-31"))
            .await
            .unwrap();
        assert_eq!(aggregate, PeriodAggregate::default());
        assert_eq!(store.last_synced_date("svc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn series_is_chronological() {
        let store = InMemoryStore::new();
        store
            .upsert_daily("svc", date("2024-01-03"), metrics(1, 0, 0, 0))
            .await
            .unwrap();
        store
            .upsert_daily("svc", date("2024-01-01"), metrics(2, 0, 0, 0))
            .await
            .unwrap();

        let rows = store
            .daily_series("svc", date("2024-01-01"), date("2024-01-05"))
            .await
            .unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date("2024-01-01"), date("2024-01-03")]);
    }

    #[tokio::test]
    async fn last_synced_date_is_max() {
        let store = InMemoryStore::new();
        store
            .upsert_daily("svc", date("2024-01-03"), metrics(0, 0, 0, 0))
            .await
            .unwrap();
        store
            .upsert_daily("svc", date("2024-01-10"), metrics(0, 0, 0, 0))
            .await
            .unwrap();
        assert_eq!(
            store.last_synced_date("svc").await.unwrap(),
            Some(date("2024-01-10"))
        );
    }

    #[tokio::test]
    async fn targets_round_trip() {
        let store = InMemoryStore::new();
        assert_eq!(store.targets("svc").await.unwrap(), None);

        let targets = Targets {
            deployment_frequency: 3.0,
            lead_time: 48.0,
            change_failure_rate: 10.0,
            mttr: 120.0,
        };
        store.upsert_targets("svc", targets).await.unwrap();
        assert_eq!(store.targets("svc").await.unwrap(), Some(targets));
    }
}
