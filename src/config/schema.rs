//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::status::HealthStatus;

/// Root configuration for the health bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Poll schedule and worker pool.
    pub poller: PollerConfig,

    /// Gauge export settings.
    pub export: ExportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Health sources to poll.
    pub sources: Vec<SourceConfig>,
}

/// Poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between the end of one evaluation and the start of the next, in seconds.
    /// Also bounds how long a single evaluation may run.
    pub period_secs: u64,

    /// Maximum number of evaluations running at once.
    pub pool_size: usize,
}

impl PollerConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            period_secs: 10,
            pool_size: 5,
        }
    }
}

/// Gauge export configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExportConfig {
    /// Tags added to every exported gauge (e.g. `team = "platform"`).
    pub common_tags: BTreeMap<String, String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A named health source declared in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Unique source name; becomes the gauge's `name` tag.
    pub name: String,

    /// Probe kind and its settings.
    #[serde(flatten)]
    pub probe: ProbeConfig,
}

/// Built-in probe kinds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeConfig {
    /// TCP connect check (e.g. "127.0.0.1:5432").
    Tcp { address: String },

    /// HTTP GET check; 2xx is UP.
    Http { url: String },

    /// Fixed status, useful for maintenance flags.
    Static { status: HealthStatus },
}
