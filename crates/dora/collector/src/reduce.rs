//! Daily metric reducer.

use chrono::NaiveDate;
use dora_types::{DailyMetrics, DeploymentConclusion, RawBatch};

/// Fold one cycle's raw events into a single day's aggregate.
///
/// Pure and deterministic: deployments count when created on `date`,
/// PR lead times average when merged on `date`, issue recovery times
/// average when closed on `date`. Averages round half away from zero
/// to whole seconds; a day with no merges or closes reads 0.
pub fn reduce_day(batch: &RawBatch, date: NaiveDate) -> DailyMetrics {
    let mut deployment_count = 0u32;
    let mut deployment_failure_count = 0u32;
    for deployment in &batch.deployments {
        if deployment.created_at.date_naive() == date {
            deployment_count += 1;
            if deployment.conclusion == DeploymentConclusion::Failure {
                deployment_failure_count += 1;
            }
        }
    }

    let lead_time_avg_seconds = mean_seconds(batch.pulls.iter().filter_map(|pr| {
        let merged = pr.merged_at?;
        (merged.date_naive() == date).then(|| (merged - pr.created_at).num_seconds())
    }));

    let mttr_avg_seconds = mean_seconds(batch.issues.iter().filter_map(|issue| {
        let closed = issue.closed_at?;
        (closed.date_naive() == date).then(|| (closed - issue.created_at).num_seconds())
    }));

    DailyMetrics {
        deployment_count,
        deployment_failure_count,
        lead_time_avg_seconds,
        mttr_avg_seconds,
    }
}

fn mean_seconds(samples: impl Iterator<Item = i64>) -> u32 {
    let mut total = 0i64;
    let mut count = 0u32;
    for sample in samples {
        total += sample;
        count += 1;
    }
    if count == 0 {
        0
    } else {
        (total as f64 / f64::from(count)).round().max(0.0) as u32
    }
}
