//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record the bridge's own metrics (probe outcomes, probe latency, cache size)
//! - Install the Prometheus recorder
//! - Serve the scrape endpoint, publishing registered gauges on every scrape
//!
//! # Metrics
//! - `health_probes_total` (counter): evaluations by source and outcome
//! - `health_probe_duration_seconds` (histogram): evaluation latency by source
//! - `health_snapshot_cache_entries` (gauge): number of cached snapshots
//! - `health_indicator` (gauge): exported through `GaugeRegistry`, one per source
//!
//! # Design Decisions
//! - Gauge values are pulled at scrape time; nothing pushes on a timer
//! - The scrape handler never waits on the poller

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Router};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::export::registry::GaugeRegistry;
use crate::lifecycle::ShutdownSignal;

pub const PROBES_TOTAL: &str = "health_probes_total";
pub const PROBE_DURATION_SECONDS: &str = "health_probe_duration_seconds";
pub const CACHE_ENTRIES: &str = "health_snapshot_cache_entries";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_counter!(PROBES_TOTAL, "Health source evaluations by outcome");
    metrics::describe_histogram!(
        PROBE_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time spent evaluating a health source"
    );
    metrics::describe_gauge!(CACHE_ENTRIES, "Number of health sources with a recorded snapshot");
}

/// Record the outcome of one evaluation (`ok`, `error`, `timeout`, `panic`).
pub fn record_probe(source: &str, outcome: &'static str) {
    metrics::counter!(PROBES_TOTAL, "source" => source.to_string(), "outcome" => outcome)
        .increment(1);
}

/// Record how long one evaluation took.
pub fn record_probe_duration(source: &str, elapsed: Duration) {
    metrics::histogram!(PROBE_DURATION_SECONDS, "source" => source.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record the number of cached snapshots.
pub fn record_cache_size(entries: usize) {
    metrics::gauge!(CACHE_ENTRIES).set(entries as f64);
}

/// Install the Prometheus recorder as the global `metrics` recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

#[derive(Clone)]
struct MetricsState {
    handle: PrometheusHandle,
    registry: Arc<GaugeRegistry>,
}

/// Router exposing `GET /metrics`.
#[allow(deprecated)]
pub fn metrics_router(handle: PrometheusHandle, registry: Arc<GaugeRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(MetricsState { handle, registry })
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(TraceLayer::new_for_http())
}

async fn render_metrics(State(state): State<MetricsState>) -> String {
    state.registry.publish();
    state.handle.render()
}

/// Serve the scrape endpoint until shutdown is signalled.
pub async fn serve_metrics(
    listener: TcpListener,
    handle: PrometheusHandle,
    registry: Arc<GaugeRegistry>,
    mut shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");

    axum::serve(listener, metrics_router(handle, registry))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    tracing::info!("Metrics endpoint stopped");
    Ok(())
}
