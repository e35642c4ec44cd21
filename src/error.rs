//! Error definitions shared across the bridge.

use thiserror::Error;

/// Failure raised by a health source while evaluating.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe target could not be turned into a request.
    #[error("Invalid probe target: {0}")]
    InvalidTarget(String),

    /// Underlying I/O failed in a way the source could not classify.
    #[error("Probe I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source-specific failure.
    #[error("Probe failed: {0}")]
    Failed(String),
}

/// Errors from constructing or driving the poller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollerError {
    /// Two registered sources share the same id.
    #[error("Duplicate health source id: {0}")]
    DuplicateSource(String),

    /// Pool size must allow at least one concurrent probe.
    #[error("Pool size must be at least 1")]
    EmptyPool,

    /// Poll period must be non-zero.
    #[error("Poll period must be non-zero")]
    ZeroPeriod,

    /// `start` was called on a poller that is already running.
    #[error("Poller is already running")]
    AlreadyRunning,
}
