//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Build sources → Start poller → Serve metrics
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Trigger → Poller tasks exit → Metrics server drains
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then poller, then metrics endpoint
//! - Shutdown has a deadline: poller tasks still running after it are aborted

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
