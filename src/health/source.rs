//! Health source abstraction.
//!
//! # Responsibilities
//! - Define the probe contract the poller drives
//! - Name sources with a stable id used as cache key and gauge tag
//! - Adapt synchronous probes onto the blocking pool

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;
use crate::health::status::Health;

/// Unique name of a registered health source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthSourceId(String);

impl HealthSourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HealthSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for HealthSourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HealthSourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HealthSourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A probe reporting the operational status of one dependency.
///
/// Implementations may be slow or fail; the poller bounds each call with a
/// timeout and isolates failures per source.
#[async_trait]
pub trait HealthSource: Send + Sync {
    /// Evaluate now.
    async fn health(&self) -> Result<Health, ProbeError>;
}

/// Runs a synchronous probe on tokio's blocking pool.
pub struct BlockingSource<F> {
    probe: Arc<F>,
}

impl<F> BlockingSource<F>
where
    F: Fn() -> Result<Health, ProbeError> + Send + Sync + 'static,
{
    pub fn new(probe: F) -> Self {
        Self {
            probe: Arc::new(probe),
        }
    }
}

#[async_trait]
impl<F> HealthSource for BlockingSource<F>
where
    F: Fn() -> Result<Health, ProbeError> + Send + Sync + 'static,
{
    async fn health(&self) -> Result<Health, ProbeError> {
        let probe = self.probe.clone();
        tokio::task::spawn_blocking(move || probe())
            .await
            .map_err(|e| ProbeError::Failed(format!("blocking probe did not complete: {}", e)))?
    }
}
