//! Scorecard computation over the stored daily rows.

use chrono::{Days, NaiveDate, Utc};
use dora_store::{MetricsStore, StoreError};
use dora_types::{
    entity_ref, overall_score, overall_tier, DailyMetricRow, DailyMetrics, Metric, MetricSnapshot,
    PeriodAggregate, Scorecard, ScorecardMetrics, Targets,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Scorecard computation errors.
#[derive(Debug, Error)]
pub enum ScorecardError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Computes scorecards and maintains per-service targets.
pub struct ScorecardService {
    store: Arc<dyn MetricsStore>,
    default_targets: Targets,
}

impl ScorecardService {
    /// Create a service over the given store.
    ///
    /// `default_targets` are reported for services without a stored
    /// targets row.
    pub fn new(store: Arc<dyn MetricsStore>, default_targets: Targets) -> Self {
        Self {
            store,
            default_targets,
        }
    }

    /// Scorecard for `service` over the trailing `window_days`.
    pub async fn scorecard(
        &self,
        service: &str,
        window_days: u32,
    ) -> Result<Scorecard, ScorecardError> {
        self.scorecard_at(service, window_days, Utc::now().date_naive())
            .await
    }

    /// Scorecard with the window anchored at `today`; split out so tests
    /// can pin the clock.
    pub async fn scorecard_at(
        &self,
        service: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<Scorecard, ScorecardError> {
        let window_days = window_days.max(1);
        let entity = entity_ref(service);

        let current_start = today - Days::new(u64::from(window_days));
        let previous_start = current_start - Days::new(u64::from(window_days));

        let current = self
            .store
            .period_aggregate(&entity, current_start, today)
            .await?;
        let previous = self
            .store
            .period_aggregate(&entity, previous_start, current_start)
            .await?;
        let daily = self.store.daily_series(&entity, current_start, today).await?;
        let history = build_history(&daily, current_start, window_days);

        let targets = self
            .store
            .targets(&entity)
            .await?
            .unwrap_or(self.default_targets);

        let metrics = ScorecardMetrics {
            deployment_frequency: snapshot(
                Metric::DeploymentFrequency,
                deployment_frequency(&current, window_days),
                deployment_frequency(&previous, window_days),
                targets.deployment_frequency,
                history.frequency,
            ),
            lead_time: snapshot(
                Metric::LeadTime,
                round1(current.lead_time_avg_seconds / 3600.0),
                round1(previous.lead_time_avg_seconds / 3600.0),
                targets.lead_time,
                history.lead_time,
            ),
            change_failure_rate: snapshot(
                Metric::ChangeFailureRate,
                change_failure_rate(current.total_deployments, current.total_failures),
                change_failure_rate(previous.total_deployments, previous.total_failures),
                targets.change_failure_rate,
                history.failure_rate,
            ),
            mttr: snapshot(
                Metric::Mttr,
                round1(current.mttr_avg_seconds / 60.0),
                round1(previous.mttr_avg_seconds / 60.0),
                targets.mttr,
                history.mttr,
            ),
        };

        let score = overall_score(metrics.tiers());

        Ok(Scorecard {
            service: service.to_string(),
            period: format!("{window_days} days"),
            metrics,
            overall_score: score.round() as u32,
            overall_tier: overall_tier(score),
        })
    }

    /// Upsert the targets row for a service.
    ///
    /// No recomputation happens here; new targets apply to the next
    /// scorecard read.
    pub async fn update_targets(
        &self,
        service: &str,
        targets: Targets,
    ) -> Result<(), ScorecardError> {
        self.store
            .upsert_targets(&entity_ref(service), targets)
            .await?;
        Ok(())
    }
}

/// Deployments per week over the window, rounded to 1 decimal.
fn deployment_frequency(aggregate: &PeriodAggregate, window_days: u32) -> f64 {
    round1(aggregate.total_deployments as f64 / f64::from(window_days) * 7.0)
}

/// Failed deployments as a percentage, 0 when nothing deployed.
fn change_failure_rate(deployments: u64, failures: u64) -> f64 {
    if deployments > 0 {
        round1(failures as f64 / deployments as f64 * 100.0)
    } else {
        0.0
    }
}

fn snapshot(
    metric: Metric,
    current: f64,
    previous: f64,
    target: f64,
    history: Vec<i64>,
) -> MetricSnapshot {
    let change = if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    };

    MetricSnapshot {
        current,
        previous,
        change: round1(change),
        target,
        tier: metric.tier(current),
        history,
    }
}

struct HistorySeries {
    frequency: Vec<i64>,
    lead_time: Vec<i64>,
    failure_rate: Vec<i64>,
    mttr: Vec<i64>,
}

/// One point per day of the window, chronological, gap-filled with zero.
///
/// The length always equals `window_days` regardless of how sparse the
/// stored series is.
fn build_history(rows: &[DailyMetricRow], window_start: NaiveDate, window_days: u32) -> HistorySeries {
    let by_date: HashMap<NaiveDate, DailyMetrics> =
        rows.iter().map(|row| (row.date, row.metrics)).collect();

    let capacity = window_days as usize;
    let mut series = HistorySeries {
        frequency: Vec::with_capacity(capacity),
        lead_time: Vec::with_capacity(capacity),
        failure_rate: Vec::with_capacity(capacity),
        mttr: Vec::with_capacity(capacity),
    };

    for offset in 1..=u64::from(window_days) {
        let date = window_start + Days::new(offset);
        let metrics = by_date.get(&date).copied().unwrap_or_default();

        series.frequency.push(i64::from(metrics.deployment_count));
        series
            .lead_time
            .push(round_div(metrics.lead_time_avg_seconds, 3600.0));
        series.failure_rate.push(if metrics.deployment_count > 0 {
            (f64::from(metrics.deployment_failure_count) / f64::from(metrics.deployment_count)
                * 100.0)
                .round() as i64
        } else {
            0
        });
        series.mttr.push(round_div(metrics.mttr_avg_seconds, 60.0));
    }

    series
}

fn round_div(value: u32, divisor: f64) -> i64 {
    (f64::from(value) / divisor).round() as i64
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use dora_store::InMemoryStore;
    use dora_types::Tier;
    use proptest::prelude::*;

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

    fn service_over(store: Arc<InMemoryStore>) -> ScorecardService {
        ScorecardService::new(store, Targets::default())
    }

    #[tokio::test]
    async fn seven_day_scenario() {
        let store = Arc::new(InMemoryStore::new());
        let today = date("2024-03-21");
        store
            .upsert_daily(
                "component:default/orders",
                date("2024-03-18"),
                metrics(10, 1, 43200, 1800),
            )
            .await
            .unwrap();

        let card = service_over(store)
            .scorecard_at("orders", 7, today)
            .await
            .unwrap();

        let m = &card.metrics;
        assert_eq!(m.deployment_frequency.current, 10.0);
        assert_eq!(m.deployment_frequency.tier, Tier::Elite);
        assert_eq!(m.change_failure_rate.current, 10.0);
        assert_eq!(m.change_failure_rate.tier, Tier::High);
        assert_eq!(m.lead_time.current, 12.0);
        assert_eq!(m.lead_time.tier, Tier::Elite);
        assert_eq!(m.mttr.current, 30.0);
        assert_eq!(m.mttr.tier, Tier::Elite);

        // (100 + 100 + 75 + 100) / 4 = 93.75
        assert_eq!(card.overall_score, 94);
        assert_eq!(card.overall_tier, Tier::Elite);
        assert_eq!(card.period, "7 days");

        // Empty previous window: positive current reads as +100%.
        assert_eq!(m.deployment_frequency.previous, 0.0);
        assert_eq!(m.deployment_frequency.change, 100.0);
    }

    #[tokio::test]
    async fn zero_deployments_window() {
        let store = Arc::new(InMemoryStore::new());
        let card = service_over(store)
            .scorecard_at("orders", 30, date("2024-03-21"))
            .await
            .unwrap();

        let m = &card.metrics;
        assert_eq!(m.deployment_frequency.current, 0.0);
        assert_eq!(m.deployment_frequency.tier, Tier::Low);
        assert_eq!(m.change_failure_rate.current, 0.0);
        assert_eq!(m.change_failure_rate.tier, Tier::Elite);
        assert_eq!(m.deployment_frequency.change, 0.0);
    }

    #[tokio::test]
    async fn default_targets_when_no_row_stored() {
        let store = Arc::new(InMemoryStore::new());
        let card = service_over(store)
            .scorecard_at("orders", 30, date("2024-03-21"))
            .await
            .unwrap();

        assert_eq!(card.metrics.deployment_frequency.target, 7.0);
        assert_eq!(card.metrics.lead_time.target, 24.0);
        assert_eq!(card.metrics.change_failure_rate.target, 5.0);
        assert_eq!(card.metrics.mttr.target, 60.0);
    }

    #[tokio::test]
    async fn updated_targets_apply_on_next_read() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_over(store);

        let new_targets = Targets {
            deployment_frequency: 3.0,
            lead_time: 72.0,
            change_failure_rate: 8.0,
            mttr: 240.0,
        };
        service.update_targets("orders", new_targets).await.unwrap();

        let card = service
            .scorecard_at("orders", 30, date("2024-03-21"))
            .await
            .unwrap();
        assert_eq!(card.metrics.deployment_frequency.target, 3.0);
        assert_eq!(card.metrics.lead_time.target, 72.0);
        assert_eq!(card.metrics.change_failure_rate.target, 8.0);
        assert_eq!(card.metrics.mttr.target, 240.0);
    }

    #[tokio::test]
    async fn history_is_gap_filled_to_window_length() {
        let store = Arc::new(InMemoryStore::new());
        let today = date("2024-03-21");
        // Two sparse rows inside the window; everything else missing.
        store
            .upsert_daily("component:default/orders", date("2024-03-20"), metrics(4, 2, 7200, 120))
            .await
            .unwrap();
        store
            .upsert_daily("component:default/orders", date("2024-03-15"), metrics(1, 0, 0, 0))
            .await
            .unwrap();

        let card = service_over(store)
            .scorecard_at("orders", 7, today)
            .await
            .unwrap();

        let m = &card.metrics;
        for history in [
            &m.deployment_frequency.history,
            &m.lead_time.history,
            &m.change_failure_rate.history,
            &m.mttr.history,
        ] {
            assert_eq!(history.len(), 7);
            assert!(history.iter().all(|v| *v >= 0));
        }

        // Window covers 2024-03-15 ..= 2024-03-21.
        assert_eq!(m.deployment_frequency.history, vec![1, 0, 0, 0, 0, 4, 0]);
        assert_eq!(m.lead_time.history[5], 2);
        assert_eq!(m.change_failure_rate.history[5], 50);
        assert_eq!(m.mttr.history[5], 2);
    }

    #[tokio::test]
    async fn change_is_relative_to_previous_window() {
        let store = Arc::new(InMemoryStore::new());
        let today = date("2024-03-21");
        // Current window (after 2024-03-14): 10 deployments.
        store
            .upsert_daily("component:default/orders", date("2024-03-18"), metrics(10, 0, 0, 0))
            .await
            .unwrap();
        // Previous window: 5 deployments.
        store
            .upsert_daily("component:default/orders", date("2024-03-10"), metrics(5, 0, 0, 0))
            .await
            .unwrap();

        let card = service_over(store)
            .scorecard_at("orders", 7, today)
            .await
            .unwrap();

        let freq = &card.metrics.deployment_frequency;
        assert_eq!(freq.current, 10.0);
        assert_eq!(freq.previous, 5.0);
        assert_eq!(freq.change, 100.0);
    }

    #[test]
    fn change_failure_rate_edge_cases() {
        assert_eq!(change_failure_rate(0, 0), 0.0);
        assert_eq!(change_failure_rate(10, 1), 10.0);
        assert_eq!(change_failure_rate(3, 1), 33.3);
        assert_eq!(change_failure_rate(7, 7), 100.0);
    }

    proptest! {
        #[test]
        fn change_failure_rate_matches_formula(deployments in 0u64..10_000, extra in 0u64..10_000) {
            let failures = deployments.min(extra);
            let rate = change_failure_rate(deployments, failures);
            if deployments == 0 {
                prop_assert_eq!(rate, 0.0);
            } else {
                let exact = failures as f64 / deployments as f64 * 100.0;
                // One decimal place, within half a tenth of the exact ratio.
                prop_assert!((rate * 10.0 - (rate * 10.0).round()).abs() < 1e-6);
                prop_assert!((rate - exact).abs() <= 0.05 + 1e-9);
                prop_assert!((0.0..=100.0).contains(&rate));
            }
        }
    }
}
