//! Collector runtime settings, assembled by the host daemon.

use std::time::Duration;

/// Settings driving service discovery and the sync schedule.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// GitHub organizations whose repositories are eligible.
    pub organizations: Vec<String>,

    /// Bearer credential for catalog and GitHub calls.
    pub token: String,

    /// Minutes between sync cycles.
    pub interval_minutes: u64,

    /// Backfill window for a service never synced before, in days.
    pub initial_days: u64,

    /// If non-empty, only these service names are synced.
    pub include_services: Vec<String>,

    /// Service names never synced.
    pub exclude_services: Vec<String>,

    /// Pause between services within one cycle.
    pub service_pacing: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            organizations: Vec::new(),
            token: String::new(),
            interval_minutes: 30,
            initial_days: 30,
            include_services: Vec::new(),
            exclude_services: Vec::new(),
            service_pacing: Duration::from_secs(3),
        }
    }
}
