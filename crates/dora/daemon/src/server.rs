//! Server setup and lifecycle management.

use crate::api::{create_router, AppState};
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use dora_collector::{Collector, GitHubClient, HttpCatalog};
use dora_scorecard::ScorecardService;
use dora_store::{InMemoryStore, MetricsStore, PostgresStore};
use std::sync::Arc;
use tokio::net::TcpListener;

/// DORA scorecard daemon server.
pub struct Server {
    config: DaemonConfig,
}

impl Server {
    /// Create a new server with the given configuration.
    pub fn new(config: DaemonConfig) -> Self {
        Self { config }
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(self) -> DaemonResult<()> {
        let store: Arc<dyn MetricsStore> = match &self.config.storage {
            StorageConfig::Memory => {
                tracing::warn!("using in-memory storage; collected metrics will not survive restarts");
                Arc::new(InMemoryStore::new())
            }
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => Arc::new(PostgresStore::connect(url, *max_connections, *connect_timeout_secs).await?),
        };

        let scorecard = Arc::new(ScorecardService::new(
            store.clone(),
            self.config.default_targets(),
        ));

        let github = GitHubClient::new(self.config.github_config())
            .map_err(|e| DaemonError::Server(e.to_string()))?;
        let catalog = HttpCatalog::new(&self.config.catalog.base_url, &self.config.github.token)
            .map_err(|e| DaemonError::Server(e.to_string()))?;
        let collector = Collector::new(
            self.config.collector_config(),
            Arc::new(catalog),
            Arc::new(github),
            store,
        );

        let collector_task = tokio::spawn({
            let collector = collector.clone();
            async move { collector.start().await }
        });

        let state = AppState::new(scorecard);
        let app = create_router(state, self.config.server.enable_cors);

        let addr = self.config.server.listen_addr;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("dora daemon listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("dora daemon shutting down");

        collector.stop().await;
        collector_task.abort();

        Ok(())
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received terminate signal, initiating graceful shutdown");
        }
    }
}
