//! HTTP and metrics listeners.

use campaign_core::config::AppConfig;
use campaign_management::{api_router, registry, CampaignLifecycle};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
}

impl ApiServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Serve the REST API until `shutdown` fires.
    pub async fn start_http(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let store = registry::current()?;
        let lifecycle = CampaignLifecycle::new(store.clone(), &self.config.delivery);
        let app = api_router(store, lifecycle);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);
        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Install the Prometheus recorder and its scrape listener.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.metrics.port);
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(addr = %addr, "Metrics exporter started");
        Ok(())
    }
}

/// Cancelled on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("Received SIGINT, shutting down"),
                        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable");
                    let _ = ctrl_c.await;
                    info!("Received SIGINT, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("Received Ctrl+C, shutting down");
        }

        trigger.cancel();
    });

    token
}
