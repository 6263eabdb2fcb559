//! Campaign server — customer segmentation and simulated campaign delivery.
//!
//! Main entry point that loads configuration, opens the store and serves the
//! REST API.

mod server;

use campaign_core::config::AppConfig;
use campaign_management::registry;
use clap::Parser;
use server::ApiServer;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "campaign-server")]
#[command(about = "Customer segmentation and campaign delivery service")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "CAMPAIGN_SERVER_CONFIG")]
    config: Option<String>,

    /// Bind address (overrides config)
    #[arg(long, env = "CAMPAIGN_SERVER__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CAMPAIGN_SERVER__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Load demo customers and orders at startup
    #[arg(long, default_value_t = false)]
    seed_demo_data: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_server=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Campaign server starting up");

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // CLI overrides
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if cli.seed_demo_data {
        config.store.seed_demo_data = true;
    }
    config.validate()?;

    info!(
        host = %config.api.host,
        http_port = config.api.http_port,
        success_rate = config.delivery.success_rate,
        max_in_flight = config.delivery.max_in_flight,
        "Configuration loaded"
    );

    let server = ApiServer::new(config.clone());
    if config.metrics.enabled {
        if let Err(e) = server.start_metrics() {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    registry::init(&config.store);
    let shutdown = server::install_signal_handler();

    info!("Campaign server is ready to serve traffic");
    let result = server.start_http(shutdown).await;

    registry::teardown();
    result
}
