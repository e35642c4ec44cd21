//! Health polling subsystem.
//!
//! # Data Flow
//! ```text
//! Poller (poller.rs):
//!     Fixed-delay timer per source
//!     → Acquire worker permit (bounded pool)
//!     → HealthSource::health() (source.rs / probes.rs)
//!     → Snapshot written to cache.rs
//!
//! Exporter (crate::export):
//!     Backend scrape
//!     → Read cache.rs entries
//!     → One gauge per source
//! ```
//!
//! # Design Decisions
//! - The poller is the only writer of the snapshot cache
//! - A failed, timed-out or panicking probe records UNKNOWN, it never
//!   removes an entry or stops the schedule
//! - Sources are fixed at construction; no registration after start

pub mod cache;
pub mod poller;
pub mod probes;
pub mod source;
pub mod status;

pub use cache::{Snapshot, SnapshotCache};
pub use poller::{probe_once, Poller};
pub use source::{BlockingSource, HealthSource, HealthSourceId};
pub use status::{Health, HealthStatus};
