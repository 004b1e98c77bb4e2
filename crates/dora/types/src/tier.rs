//! Tier classification and composite scoring.
//!
//! Thresholds follow the industry-standard DORA bands. Deployment
//! frequency is a higher-is-better metric; the other three are
//! lower-is-better.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal performance band. Derived ordering is `Low < Medium < High < Elite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Medium,
    High,
    Elite,
}

impl Tier {
    /// Numeric score used when combining the four metric tiers.
    pub fn score(self) -> f64 {
        match self {
            Tier::Elite => 100.0,
            Tier::High => 75.0,
            Tier::Medium => 50.0,
            Tier::Low => 25.0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Elite => "Elite",
            Tier::High => "High",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
        };
        f.write_str(name)
    }
}

/// The four DORA metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Deployments per week.
    DeploymentFrequency,
    /// Average PR cycle time in hours.
    LeadTime,
    /// Failed deployments as a percentage of all deployments.
    ChangeFailureRate,
    /// Average incident resolution time in minutes.
    Mttr,
}

struct Thresholds {
    elite: f64,
    high: f64,
    medium: f64,
}

impl Metric {
    /// Whether larger values rank higher for this metric.
    pub fn higher_is_better(self) -> bool {
        matches!(self, Metric::DeploymentFrequency)
    }

    fn thresholds(self) -> Thresholds {
        match self {
            Metric::DeploymentFrequency => Thresholds {
                elite: 7.0,
                high: 1.0,
                medium: 0.25,
            },
            Metric::LeadTime => Thresholds {
                elite: 24.0,
                high: 168.0,
                medium: 720.0,
            },
            Metric::ChangeFailureRate => Thresholds {
                elite: 5.0,
                high: 15.0,
                medium: 30.0,
            },
            Metric::Mttr => Thresholds {
                elite: 60.0,
                high: 1440.0,
                medium: 10080.0,
            },
        }
    }

    /// Classify a metric value into its performance band.
    pub fn tier(self, value: f64) -> Tier {
        let t = self.thresholds();
        if self.higher_is_better() {
            if value >= t.elite {
                Tier::Elite
            } else if value >= t.high {
                Tier::High
            } else if value >= t.medium {
                Tier::Medium
            } else {
                Tier::Low
            }
        } else if value <= t.elite {
            Tier::Elite
        } else if value <= t.high {
            Tier::High
        } else if value <= t.medium {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}

/// Unweighted mean of the four per-metric tier scores.
pub fn overall_score(tiers: [Tier; 4]) -> f64 {
    tiers.iter().map(|t| t.score()).sum::<f64>() / 4.0
}

/// The tier banding applied to a composite score.
pub fn overall_tier(score: f64) -> Tier {
    if score >= 75.0 {
        Tier::Elite
    } else if score >= 50.0 {
        Tier::High
    } else if score >= 25.0 {
        Tier::Medium
    } else {
        Tier::Low
    }
}
