//! Transient raw events fetched from the source host.
//!
//! These live only within a single collection cycle; they feed the daily
//! reducer and are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a deployment, derived from its latest status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentConclusion {
    Success,
    Failure,
    Pending,
}

impl DeploymentConclusion {
    /// Map the latest deployment status state to a conclusion.
    ///
    /// `SUCCESS` is a success, `FAILURE` and `ERROR` are failures, and
    /// anything else (including a missing status) is still pending.
    pub fn from_status_state(state: Option<&str>) -> Self {
        match state {
            Some("SUCCESS") => DeploymentConclusion::Success,
            Some("FAILURE") | Some("ERROR") => DeploymentConclusion::Failure,
            _ => DeploymentConclusion::Pending,
        }
    }
}

/// One production deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub created_at: DateTime<Utc>,
    pub conclusion: DeploymentConclusion,
}

/// One pull request against the default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// One failure-labeled issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueRecord {
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Everything fetched for one service in one sync cycle.
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    pub deployments: Vec<DeploymentRecord>,
    pub pulls: Vec<PullRequestRecord>,
    pub issues: Vec<IssueRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conclusion_mapping() {
        assert_eq!(
            DeploymentConclusion::from_status_state(Some("SUCCESS")),
            DeploymentConclusion::Success
        );
        assert_eq!(
            DeploymentConclusion::from_status_state(Some("FAILURE")),
            DeploymentConclusion::Failure
        );
        assert_eq!(
            DeploymentConclusion::from_status_state(Some("ERROR")),
            DeploymentConclusion::Failure
        );
        assert_eq!(
            DeploymentConclusion::from_status_state(Some("IN_PROGRESS")),
            DeploymentConclusion::Pending
        );
        assert_eq!(
            DeploymentConclusion::from_status_state(None),
            DeploymentConclusion::Pending
        );
    }
}
