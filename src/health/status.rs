//! Health status values reported by sources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a single health evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Down,
    OutOfService,
    Unknown,
}

impl HealthStatus {
    /// Wire code, e.g. `OUT_OF_SERVICE`.
    pub fn code(&self) -> &'static str {
        match self {
            HealthStatus::Up => "UP",
            HealthStatus::Down => "DOWN",
            HealthStatus::OutOfService => "OUT_OF_SERVICE",
            HealthStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unrecognised codes parse as `Unknown` rather than failing.
impl FromStr for HealthStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "UP" => HealthStatus::Up,
            "DOWN" => HealthStatus::Down,
            "OUT_OF_SERVICE" => HealthStatus::OutOfService,
            _ => HealthStatus::Unknown,
        };
        Ok(status)
    }
}

/// Result of evaluating a health source: a status plus opaque details.
///
/// Details are carried through to snapshots untouched; nothing in the
/// bridge interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl Health {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            details: Map::new(),
        }
    }

    pub fn up() -> Self {
        Self::new(HealthStatus::Up)
    }

    pub fn down() -> Self {
        Self::new(HealthStatus::Down)
    }

    pub fn out_of_service() -> Self {
        Self::new(HealthStatus::OutOfService)
    }

    pub fn unknown() -> Self {
        Self::new(HealthStatus::Unknown)
    }

    /// Attach a detail entry, replacing any previous value for `key`.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
