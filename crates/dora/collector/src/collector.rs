//! The periodic sync cycle.

use crate::catalog::Catalog;
use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::github::SourceHost;
use crate::reduce::reduce_day;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use dora_store::MetricsStore;
use dora_types::{entity_ref, CatalogService, RawBatch, RepoCoordinate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::interval;

/// Drives discovery, incremental fetch, day bucketing, and persistence.
///
/// Services are processed strictly sequentially with a pacing delay;
/// the serialization is the backpressure mechanism against external
/// rate limits, not an accident.
pub struct Collector {
    config: CollectorConfig,
    catalog: Arc<dyn Catalog>,
    host: Arc<dyn SourceHost>,
    store: Arc<dyn MetricsStore>,
    running: RwLock<bool>,
    cycle_lock: Mutex<()>,
}

impl Collector {
    /// Create a collector over the given collaborators.
    pub fn new(
        config: CollectorConfig,
        catalog: Arc<dyn Catalog>,
        host: Arc<dyn SourceHost>,
        store: Arc<dyn MetricsStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            catalog,
            host,
            store,
            running: RwLock::new(false),
            cycle_lock: Mutex::new(()),
        })
    }

    /// Run the sync loop: one immediate cycle, then one per interval.
    ///
    /// Stays idle (after logging) when no credential or no organization
    /// is configured; both are required to reach the external APIs.
    pub async fn start(self: Arc<Self>) {
        if self.config.token.is_empty() {
            tracing::error!(
                "github token not configured; set github.token or GITHUB_TOKEN, collector idle"
            );
            return;
        }
        if self.config.organizations.is_empty() {
            tracing::warn!("no github organizations configured; collector idle");
            return;
        }

        {
            let mut running = self.running.write().await;
            *running = true;
        }

        tracing::info!(
            interval_minutes = self.config.interval_minutes,
            organizations = ?self.config.organizations,
            "collector started"
        );

        let mut ticker = interval(Duration::from_secs(self.config.interval_minutes.max(1) * 60));
        loop {
            ticker.tick().await;
            if !*self.running.read().await {
                break;
            }
            self.sync_once().await;
        }

        tracing::info!("collector stopped");
    }

    /// Stop the loop after the current cycle.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// Run a single sync cycle. Single-flight: a cycle that is still in
    /// progress causes this call to be skipped.
    pub async fn sync_once(&self) {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            tracing::warn!("sync cycle still in flight; skipping this tick");
            return;
        };

        tracing::info!("sync cycle started");
        if let Err(err) = self.sync_all_services().await {
            tracing::error!(error = %err, "catalog fetch failed; cycle abandoned");
        }
    }

    async fn sync_all_services(&self) -> Result<(), CollectorError> {
        let services = self.catalog.services().await?;
        let eligible: Vec<&CatalogService> =
            services.iter().filter(|s| self.eligible(s)).collect();

        tracing::info!(count = eligible.len(), "services to process");

        for service in eligible {
            // `eligible` guarantees the repo is present.
            let Some(repo) = &service.repo else { continue };
            if let Err(err) = self.process_service(&service.name, repo).await {
                tracing::error!(
                    service = %service.name,
                    error = %err,
                    "service sync failed; continuing with next service"
                );
            }
            tokio::time::sleep(self.config.service_pacing).await;
        }

        Ok(())
    }

    /// Discovery filter: repository annotation present, include/exclude
    /// lists honored, repository owner in the organization allow-list.
    fn eligible(&self, service: &CatalogService) -> bool {
        let Some(repo) = &service.repo else {
            return false;
        };
        if !self.config.include_services.is_empty()
            && !self.config.include_services.contains(&service.name)
        {
            return false;
        }
        if self.config.exclude_services.contains(&service.name) {
            return false;
        }
        self.config.organizations.iter().any(|org| org == &repo.owner)
    }

    async fn process_service(
        &self,
        service: &str,
        repo: &RepoCoordinate,
    ) -> Result<(), CollectorError> {
        let entity = entity_ref(service);
        let today = Utc::now().date_naive();

        let last_synced = self.store.last_synced_date(&entity).await?;
        let since_date = resume_date(last_synced, today, self.config.initial_days);
        let since = day_start(since_date);

        tracing::info!(service, repo = %repo, since = %since_date, "fetching raw events");

        let batch = RawBatch {
            deployments: self.host.deployments(repo, since).await?,
            pulls: self.host.merged_pulls(repo, since).await?,
            issues: self.host.failure_issues(repo, since).await?,
        };

        tracing::info!(
            service,
            deployments = batch.deployments.len(),
            pulls = batch.pulls.len(),
            issues = batch.issues.len(),
            "raw events fetched"
        );

        // Every date gets a row, zero-activity days included, so the
        // stored series stays contiguous for the scorecard history.
        let mut day = since_date;
        while day <= today {
            let metrics = reduce_day(&batch, day);
            self.store.upsert_daily(&entity, day, metrics).await?;
            day = day + Days::new(1);
        }

        tracing::info!(service, "sync complete");
        Ok(())
    }
}

/// The date to resume fetching from.
///
/// A previously synced service resumes one day before its watermark to
/// re-cover the partially ingested boundary day; a new service backfills
/// the configured initial window.
fn resume_date(last_synced: Option<NaiveDate>, today: NaiveDate, initial_days: u64) -> NaiveDate {
    match last_synced {
        Some(last) => last - Days::new(1),
        None => today - Days::new(initial_days),
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use dora_store::InMemoryStore;
    use dora_types::{DeploymentConclusion, DeploymentRecord, IssueRecord, PullRequestRecord};

    struct FixedCatalog(Vec<CatalogService>);

    #[async_trait]
    impl Catalog for FixedCatalog {
        async fn services(&self) -> Result<Vec<CatalogService>, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct FixedHost {
        batch: RawBatch,
    }

    #[async_trait]
    impl SourceHost for FixedHost {
        async fn deployments(
            &self,
            _repo: &RepoCoordinate,
            _since: DateTime<Utc>,
        ) -> Result<Vec<DeploymentRecord>, FetchError> {
            Ok(self.batch.deployments.clone())
        }

        async fn merged_pulls(
            &self,
            _repo: &RepoCoordinate,
            _since: DateTime<Utc>,
        ) -> Result<Vec<PullRequestRecord>, FetchError> {
            Ok(self.batch.pulls.clone())
        }

        async fn failure_issues(
            &self,
            _repo: &RepoCoordinate,
            _since: DateTime<Utc>,
        ) -> Result<Vec<IssueRecord>, FetchError> {
            Ok(self.batch.issues.clone())
        }
    }

    fn service(name: &str, repo: &str) -> CatalogService {
        CatalogService {
            name: name.to_string(),
            repo: Some(repo.parse().unwrap()),
        }
    }

    fn test_config() -> CollectorConfig {
        CollectorConfig {
            organizations: vec!["acme".to_string()],
            token: "token".to_string(),
            initial_days: 5,
            service_pacing: Duration::ZERO,
            ..Default::default()
        }
    }

    fn collector_with(
        config: CollectorConfig,
        services: Vec<CatalogService>,
        batch: RawBatch,
        store: Arc<InMemoryStore>,
    ) -> Arc<Collector> {
        Collector::new(
            config,
            Arc::new(FixedCatalog(services)),
            Arc::new(FixedHost { batch }),
            store,
        )
    }

    #[test]
    fn resume_covers_one_overlap_day() {
        let last: NaiveDate = "2024-01-10".parse().unwrap();
        let today: NaiveDate = "2024-01-15".parse().unwrap();
        assert_eq!(
            resume_date(Some(last), today, 30),
            "2024-01-09".parse().unwrap()
        );
    }

    #[test]
    fn first_sync_backfills_initial_window() {
        let today: NaiveDate = "2024-01-31".parse().unwrap();
        assert_eq!(resume_date(None, today, 30), "2024-01-01".parse().unwrap());
    }

    #[tokio::test]
    async fn cycle_writes_contiguous_zero_filled_rows() {
        let today = Utc::now().date_naive();
        let active_day = today - Days::new(2);
        let batch = RawBatch {
            deployments: vec![
                DeploymentRecord {
                    created_at: day_start(active_day) + chrono::Duration::hours(9),
                    conclusion: DeploymentConclusion::Success,
                },
                DeploymentRecord {
                    created_at: day_start(active_day) + chrono::Duration::hours(17),
                    conclusion: DeploymentConclusion::Failure,
                },
            ],
            ..Default::default()
        };

        let store = Arc::new(InMemoryStore::new());
        let collector = collector_with(
            test_config(),
            vec![service("orders", "acme/orders")],
            batch,
            store.clone(),
        );
        collector.sync_once().await;

        let entity = entity_ref("orders");
        let since = today - Days::new(5);
        let rows = store.daily_series(&entity, since, today).await.unwrap();
        // [today-5, today] inclusive.
        assert_eq!(rows.len(), 6);
        for row in &rows {
            if row.date == active_day {
                assert_eq!(row.metrics.deployment_count, 2);
                assert_eq!(row.metrics.deployment_failure_count, 1);
            } else {
                assert_eq!(row.metrics.deployment_count, 0);
            }
        }
        assert_eq!(store.last_synced_date(&entity).await.unwrap(), Some(today));
    }

    #[tokio::test]
    async fn rerunning_a_cycle_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let collector = collector_with(
            test_config(),
            vec![service("orders", "acme/orders")],
            RawBatch::default(),
            store.clone(),
        );
        collector.sync_once().await;
        collector.sync_once().await;

        let today = Utc::now().date_naive();
        let rows = store
            .daily_series(&entity_ref("orders"), today - Days::new(10), today)
            .await
            .unwrap();
        // Second run resumes from watermark - 1 and overwrites; no duplicates.
        assert_eq!(rows.len(), 6);
    }

    #[tokio::test]
    async fn filters_exclude_list_and_foreign_orgs() {
        let store = Arc::new(InMemoryStore::new());
        let mut config = test_config();
        config.exclude_services = vec!["legacy".to_string()];
        let collector = collector_with(
            config,
            vec![
                service("legacy", "acme/legacy"),
                service("external", "othercorp/external"),
                CatalogService {
                    name: "no-repo".to_string(),
                    repo: None,
                },
            ],
            RawBatch::default(),
            store.clone(),
        );
        collector.sync_once().await;

        for name in ["legacy", "external", "no-repo"] {
            assert_eq!(
                store.last_synced_date(&entity_ref(name)).await.unwrap(),
                None,
                "{name} should not have been synced"
            );
        }
    }

    #[tokio::test]
    async fn include_list_limits_processing() {
        let store = Arc::new(InMemoryStore::new());
        let mut config = test_config();
        config.include_services = vec!["orders".to_string()];
        let collector = collector_with(
            config,
            vec![service("orders", "acme/orders"), service("billing", "acme/billing")],
            RawBatch::default(),
            store.clone(),
        );
        collector.sync_once().await;

        assert!(store
            .last_synced_date(&entity_ref("orders"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .last_synced_date(&entity_ref("billing"))
            .await
            .unwrap()
            .is_none());
    }
}
