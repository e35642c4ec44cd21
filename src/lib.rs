//! Health-to-metrics bridge.
//!
//! Polls a fixed set of health sources, keeps the latest snapshot per source
//! and exposes each as a `health.indicator{name=<id>}` gauge sampled by the
//! metrics backend.

pub mod config;
pub mod error;
pub mod export;
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use config::BridgeConfig;
pub use export::{GaugeRegistry, HealthExporter};
pub use health::{Poller, SnapshotCache};
pub use lifecycle::Shutdown;
