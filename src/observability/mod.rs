//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Poller and exporter produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (probe counters, latency histograms, cache gauge)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
