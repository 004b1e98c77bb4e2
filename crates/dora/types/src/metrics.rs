//! Stored metric aggregates and per-service targets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day's aggregate counters for a service.
///
/// Invariant: `deployment_failure_count <= deployment_count`. The two
/// `*_avg_seconds` fields are 0 when nothing merged/closed that day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub deployment_count: u32,
    pub deployment_failure_count: u32,
    pub lead_time_avg_seconds: u32,
    pub mttr_avg_seconds: u32,
}

/// A stored daily row: date plus that day's aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyMetricRow {
    pub date: NaiveDate,
    pub metrics: DailyMetrics,
}

/// Summed/averaged aggregate over a date window.
///
/// Missing rows contribute nothing; an empty window reads as all zeroes.
/// Defaulting happens at the store boundary, not in business logic.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodAggregate {
    pub total_deployments: u64,
    pub total_failures: u64,
    pub lead_time_avg_seconds: f64,
    pub mttr_avg_seconds: f64,
}

/// Per-service metric targets.
///
/// Units: deployments per week, hours, percent, minutes. The defaults are
/// what a scorecard reports when no row has been stored for the service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Targets {
    pub deployment_frequency: f64,
    pub lead_time: f64,
    pub change_failure_rate: f64,
    pub mttr: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            deployment_frequency: 7.0,
            lead_time: 24.0,
            change_failure_rate: 5.0,
            mttr: 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_defaults() {
        let t = Targets::default();
        assert_eq!(t.deployment_frequency, 7.0);
        assert_eq!(t.lead_time, 24.0);
        assert_eq!(t.change_failure_rate, 5.0);
        assert_eq!(t.mttr, 60.0);
    }

    #[test]
    fn targets_payload_uses_camel_case() {
        let t: Targets = serde_json::from_str(
            r#"{"deploymentFrequency":3,"leadTime":48,"changeFailureRate":10,"mttr":120}"#,
        )
        .unwrap();
        assert_eq!(t.deployment_frequency, 3.0);
        assert_eq!(t.lead_time, 48.0);
        assert_eq!(t.change_failure_rate, 10.0);
        assert_eq!(t.mttr, 120.0);
    }
}
