//! Snapshot cache to gauge exporter.

use std::sync::Arc;

use crate::export::encoder::encode_status;
use crate::export::registry::{GaugeReading, GaugeRegistry, GaugeSet};
use crate::health::cache::SnapshotCache;

/// Gauge name under which every source is reported.
pub const HEALTH_GAUGE_NAME: &str = "health.indicator";

/// Tag key carrying the source id.
pub const NAME_TAG: &str = "name";

/// Configured sources still waiting for their first snapshot.
pub const PENDING_GAUGE_NAME: &str = "health.sources.pending";

/// Presents the snapshot cache as one `health.indicator` gauge per source.
///
/// Each sample re-reads the cache; a source with no snapshot yet has no
/// gauge until its first poll lands.
#[derive(Debug, Clone)]
pub struct HealthExporter {
    cache: SnapshotCache,
}

impl HealthExporter {
    pub fn new(cache: SnapshotCache) -> Self {
        Self { cache }
    }

    /// Register a `health.sources.pending` gauge: how many of the
    /// `configured` sources have not been cached yet.
    pub fn bind_pending_gauge(&self, registry: &GaugeRegistry, configured: usize) {
        let cache = self.cache.clone();
        registry.register_gauge(PENDING_GAUGE_NAME, vec![], move || {
            Some(configured.saturating_sub(cache.len()) as f64)
        });
    }

    /// Register this exporter with `registry`. Binding once is enough;
    /// sources that appear later are picked up on the next sample.
    pub fn bind_to(self, registry: &GaugeRegistry) {
        registry.register(Arc::new(self));
    }
}

impl GaugeSet for HealthExporter {
    fn sample(&self) -> Vec<GaugeReading> {
        let mut entries = self.cache.entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        entries
            .into_iter()
            .map(|(id, snapshot)| {
                GaugeReading::new(
                    HEALTH_GAUGE_NAME,
                    vec![(NAME_TAG.to_string(), id.to_string())],
                    encode_status(snapshot.status),
                )
            })
            .collect()
    }
}
