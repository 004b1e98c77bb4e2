//! Configuration for the DORA scorecard daemon.

use dora_collector::{CollectorConfig, GitHubConfig};
use dora_types::Targets;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// GitHub configuration
    #[serde(default)]
    pub github: GitHubSettings,

    /// Deployment environment aliases
    #[serde(default)]
    pub environments: EnvironmentSettings,

    /// Issue label mappings
    #[serde(default)]
    pub labels: LabelSettings,

    /// Data collection settings
    #[serde(default)]
    pub collection: CollectionSettings,

    /// Default metric targets
    #[serde(default)]
    pub targets: TargetSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".parse().unwrap(),
            enable_cors: true,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

/// Catalog API location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog API base URL
    #[serde(default = "default_catalog_base")]
    pub base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base(),
        }
    }
}

/// GitHub access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    /// Organizations whose repositories are monitored
    #[serde(default)]
    pub organizations: Vec<String>,

    /// Access token; falls back to the GITHUB_TOKEN environment variable
    #[serde(default)]
    pub token: String,

    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// GraphQL endpoint URL
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            organizations: Vec::new(),
            token: String::new(),
            api_base: default_api_base(),
            graphql_url: default_graphql_url(),
        }
    }
}

/// Deployment environment aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSettings {
    /// Environment names counted as production
    #[serde(default = "default_production_environments")]
    pub production: Vec<String>,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            production: default_production_environments(),
        }
    }
}

/// Issue label mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSettings {
    /// Label marking failure/incident issues
    #[serde(default = "default_failure_label")]
    pub failure_issue: String,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            failure_issue: default_failure_label(),
        }
    }
}

/// Data collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSettings {
    /// Sync interval in minutes
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Initial backfill window in days
    #[serde(default = "default_initial_days")]
    pub initial_days: u64,

    /// Services to include (empty means all)
    #[serde(default)]
    pub include_services: Vec<String>,

    /// Services to exclude
    #[serde(default)]
    pub exclude_services: Vec<String>,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            initial_days: default_initial_days(),
            include_services: Vec::new(),
            exclude_services: Vec::new(),
        }
    }
}

/// Default targets reported for services without a stored row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Deployments per week
    #[serde(default = "default_target_frequency")]
    pub deployment_frequency: f64,

    /// Lead time in hours
    #[serde(default = "default_target_lead_time")]
    pub lead_time: f64,

    /// Change failure rate in percent
    #[serde(default = "default_target_failure_rate")]
    pub change_failure_rate: f64,

    /// MTTR in minutes
    #[serde(default = "default_target_mttr")]
    pub mttr: f64,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            deployment_frequency: default_target_frequency(),
            lead_time: default_target_lead_time(),
            change_failure_rate: default_target_failure_rate(),
            mttr: default_target_mttr(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_catalog_base() -> String {
    "http://127.0.0.1:7007/api/catalog".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_production_environments() -> Vec<String> {
    vec![
        "prd".to_string(),
        "prod".to_string(),
        "production".to_string(),
    ]
}

fn default_failure_label() -> String {
    "bug".to_string()
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_initial_days() -> u64 {
    30
}

fn default_target_frequency() -> f64 {
    7.0
}

fn default_target_lead_time() -> f64 {
    24.0
}

fn default_target_failure_rate() -> f64 {
    5.0
}

fn default_target_mttr() -> f64 {
    60.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `DORA_`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DORA")
                .separator("_")
                .try_parsing(true),
        );

        let mut loaded: DaemonConfig = builder.build()?.try_deserialize()?;
        if loaded.github.token.is_empty() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                loaded.github.token = token;
            }
        }
        Ok(loaded)
    }

    /// The collector's settings.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            organizations: self.github.organizations.clone(),
            token: self.github.token.clone(),
            interval_minutes: self.collection.interval_minutes,
            initial_days: self.collection.initial_days,
            include_services: self.collection.include_services.clone(),
            exclude_services: self.collection.exclude_services.clone(),
            service_pacing: Duration::from_secs(3),
        }
    }

    /// The GitHub client's settings.
    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig {
            token: self.github.token.clone(),
            api_base: self.github.api_base.clone(),
            graphql_url: self.github.graphql_url.clone(),
            production_environments: self.environments.production.clone(),
            failure_issue_label: self.labels.failure_issue.clone(),
        }
    }

    /// The default metric targets.
    pub fn default_targets(&self) -> Targets {
        Targets {
            deployment_frequency: self.targets.deployment_frequency,
            lead_time: self.targets.lead_time,
            change_failure_rate: self.targets.change_failure_rate,
            mttr: self.targets.mttr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_collection_contract() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert!(matches!(config.storage, StorageConfig::Memory));
        assert_eq!(config.collection.interval_minutes, 30);
        assert_eq!(config.collection.initial_days, 30);
        assert_eq!(
            config.environments.production,
            vec!["prd", "prod", "production"]
        );
        assert_eq!(config.labels.failure_issue, "bug");
    }

    #[test]
    fn default_targets_are_the_served_defaults() {
        let targets = DaemonConfig::default().default_targets();
        assert_eq!(targets, Targets::default());
    }

    #[test]
    fn collector_config_carries_filters() {
        let mut config = DaemonConfig::default();
        config.github.organizations = vec!["acme".to_string()];
        config.collection.exclude_services = vec!["legacy".to_string()];

        let collector = config.collector_config();
        assert_eq!(collector.organizations, vec!["acme"]);
        assert_eq!(collector.exclude_services, vec!["legacy"]);
        assert_eq!(collector.service_pacing, Duration::from_secs(3));
    }
}
