//! The scorecard response shape served over HTTP.

use crate::tier::Tier;
use serde::{Deserialize, Serialize};

/// One metric's entry on the scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    /// Value over the current window, in the metric's unit.
    pub current: f64,
    /// Value over the preceding window of the same length.
    pub previous: f64,
    /// Percent change vs. the previous window.
    pub change: f64,
    /// Configured or default target.
    pub target: f64,
    pub tier: Tier,
    /// One point per day of the current window, chronological.
    pub history: Vec<i64>,
}

/// The four DORA metrics of one scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardMetrics {
    pub deployment_frequency: MetricSnapshot,
    pub lead_time: MetricSnapshot,
    pub change_failure_rate: MetricSnapshot,
    pub mttr: MetricSnapshot,
}

impl ScorecardMetrics {
    /// The four metric tiers in canonical order.
    pub fn tiers(&self) -> [Tier; 4] {
        [
            self.deployment_frequency.tier,
            self.lead_time.tier,
            self.change_failure_rate.tier,
            self.mttr.tier,
        ]
    }
}

/// Scorecard for one service over one rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub service: String,
    /// Human-readable window length, e.g. `"30 days"`.
    pub period: String,
    pub metrics: ScorecardMetrics,
    pub overall_score: u32,
    pub overall_tier: Tier,
}
