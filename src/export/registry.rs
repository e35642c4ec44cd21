//! Gauge registry bridging pull-based gauge sets to the `metrics` recorder.
//!
//! # Responsibilities
//! - Hold registered gauge sets and single-value suppliers
//! - Enumerate current gauge readings on demand (`sample`)
//! - Write readings to the installed recorder right before a scrape (`publish`)
//! - Apply common tags to every reading
//!
//! # Design Decisions
//! - Registration is rare, sampling is hot: the set list sits behind an
//!   `ArcSwap` so samplers never take a lock
//! - A reading's own label wins over a common tag with the same key

use std::sync::Arc;

use arc_swap::ArcSwap;

/// One sampled gauge value.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeReading {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl GaugeReading {
    pub fn new(name: impl Into<String>, labels: Vec<(String, String)>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }

    /// Value of the label `key`, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A source of gauge readings, sampled each time the backend pulls.
pub trait GaugeSet: Send + Sync {
    fn sample(&self) -> Vec<GaugeReading>;
}

/// A single named gauge whose value comes from a closure.
struct SupplierGauge<F> {
    name: String,
    labels: Vec<(String, String)>,
    supplier: F,
}

impl<F> GaugeSet for SupplierGauge<F>
where
    F: Fn() -> Option<f64> + Send + Sync,
{
    fn sample(&self) -> Vec<GaugeReading> {
        match (self.supplier)() {
            Some(value) => vec![GaugeReading::new(self.name.clone(), self.labels.clone(), value)],
            None => Vec::new(),
        }
    }
}

/// Registry of pull-based gauges.
pub struct GaugeRegistry {
    sets: ArcSwap<Vec<Arc<dyn GaugeSet>>>,
    common_tags: Vec<(String, String)>,
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self::with_common_tags(Vec::<(String, String)>::new())
    }

    /// Create a registry that adds `tags` to every reading.
    pub fn with_common_tags<I, K, V>(tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            sets: ArcSwap::from_pointee(Vec::new()),
            common_tags: tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Register a gauge set; it is sampled on every `sample`/`publish`.
    pub fn register(&self, set: Arc<dyn GaugeSet>) {
        self.sets.rcu(|sets| {
            let mut next = sets.to_vec();
            next.push(set.clone());
            next
        });
    }

    /// Register one gauge backed by `supplier`. A `None` from the supplier
    /// omits the gauge from that sample.
    pub fn register_gauge<F>(
        &self,
        name: impl Into<String>,
        labels: Vec<(String, String)>,
        supplier: F,
    ) where
        F: Fn() -> Option<f64> + Send + Sync + 'static,
    {
        self.register(Arc::new(SupplierGauge {
            name: name.into(),
            labels,
            supplier,
        }));
    }

    /// Number of registered gauge sets.
    pub fn len(&self) -> usize {
        self.sets.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate the current value of every registered gauge.
    pub fn sample(&self) -> Vec<GaugeReading> {
        let sets = self.sets.load();
        sets.iter()
            .flat_map(|set| set.sample())
            .map(|reading| self.apply_common_tags(reading))
            .collect()
    }

    /// Sample every gauge and set its value on the installed recorder.
    pub fn publish(&self) {
        for reading in self.sample() {
            let labels: Vec<metrics::Label> = reading
                .labels
                .into_iter()
                .map(|(k, v)| metrics::Label::new(k, v))
                .collect();
            metrics::gauge!(reading.name, labels).set(reading.value);
        }
    }

    fn apply_common_tags(&self, mut reading: GaugeReading) -> GaugeReading {
        for (key, value) in &self.common_tags {
            if reading.label(key).is_none() {
                reading.labels.push((key.clone(), value.clone()));
            }
        }
        reading
    }
}

impl Default for GaugeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
