//! dorad - DORA scorecard daemon.
//!
//! Serves per-service scorecards over HTTP and keeps the daily metric
//! rows fresh by syncing deployment, pull-request, and issue data from
//! GitHub on a fixed interval.

use clap::Parser;
use dora_daemon::config::DaemonConfig;
use dora_daemon::error::{DaemonError, DaemonResult};
use dora_daemon::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DORA scorecard daemon CLI.
#[derive(Parser)]
#[command(name = "dorad")]
#[command(about = "DORA scorecard daemon - metrics collection and API", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DORA_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "DORA_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    listen: String,

    /// Log level
    #[arg(long, env = "DORA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "DORA_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    config.server.listen_addr = cli
        .listen
        .parse()
        .map_err(|e| DaemonError::Config(format!("invalid listen address: {}", e)))?;

    println!(
        "dorad {} - DORA scorecard daemon\n  listening: {}\n  organizations: {:?}",
        env!("CARGO_PKG_VERSION"),
        config.server.listen_addr,
        config.github.organizations
    );

    Server::new(config).run().await
}
