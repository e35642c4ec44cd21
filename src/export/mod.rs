//! Gauge export subsystem.
//!
//! # Data Flow
//! ```text
//! Backend sampling pull (scrape)
//!     → registry.rs (GaugeRegistry::sample / publish)
//!     → exporter.rs (iterate SnapshotCache entries)
//!     → encoder.rs (HealthStatus → f64)
//!     → `health.indicator{name=<id>}`
//! ```
//!
//! # Design Decisions
//! - Pull-based: gauge sets are re-read on every sample, so sources whose
//!   first poll lands after binding still show up
//! - Exporting never mutates the cache and never waits on the poller

pub mod encoder;
pub mod exporter;
pub mod registry;

pub use encoder::encode_status;
pub use exporter::{HealthExporter, HEALTH_GAUGE_NAME, NAME_TAG};
pub use registry::{GaugeReading, GaugeRegistry, GaugeSet};
