//! Health bridge daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   fixed delay   ┌──────────┐   put    ┌───────────────┐
//!   │ HealthSource │◀────────────────│  Poller  │─────────▶│ SnapshotCache │
//!   │ (tcp/http/…) │   (pool-bound)  └──────────┘          └───────┬───────┘
//!   └──────────────┘                                               │ entries
//!                                                                  ▼
//!   ┌────────────┐  GET /metrics  ┌───────────────┐  sample  ┌────────────────┐
//!   │ Prometheus │───────────────▶│ GaugeRegistry │─────────▶│ HealthExporter │
//!   └────────────┘                └───────────────┘          └────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use health_bridge::config::{load_config, BridgeConfig};
use health_bridge::export::{GaugeRegistry, HealthExporter};
use health_bridge::health::{probes, Poller, SnapshotCache};
use health_bridge::lifecycle::{signals, Shutdown};
use health_bridge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "health-bridge")]
#[command(about = "Polls health sources and exports them as gauges", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    logging::init_logging(level, config.observability.log_format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        sources = config.sources.len(),
        period_secs = config.poller.period_secs,
        pool_size = config.poller.pool_size,
        "health-bridge starting"
    );
    if config.sources.is_empty() {
        tracing::warn!("No health sources configured; only self metrics will be exported");
    }

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config.poller,
        cache.clone(),
        probes::build_sources(&config.sources),
    )?;

    let registry = Arc::new(GaugeRegistry::with_common_tags(
        config.export.common_tags.clone(),
    ));
    let exporter = HealthExporter::new(cache.clone());
    exporter.bind_pending_gauge(&registry, config.sources.len());
    exporter.bind_to(&registry);

    let shutdown = Shutdown::new();
    let metrics_server = if config.observability.metrics_enabled {
        let handle = metrics::install_recorder()?;
        let listener = TcpListener::bind(&config.observability.metrics_address).await?;
        Some(tokio::spawn(metrics::serve_metrics(
            listener,
            handle,
            registry.clone(),
            shutdown.subscribe(),
        )))
    } else {
        tracing::info!("Metrics endpoint disabled");
        None
    };

    poller.start()?;

    signals::wait_for_signal().await;
    tracing::info!("Shutting down");

    shutdown.trigger();
    poller.stop().await;
    if let Some(server) = metrics_server {
        match server.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Metrics endpoint failed"),
            Err(e) => tracing::error!(error = %e, "Metrics endpoint task panicked"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
