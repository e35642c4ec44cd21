//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (period > 0, pool size > 0)
//! - Detect duplicate source names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::{BridgeConfig, ProbeConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("poller.period_secs must be at least 1")]
    ZeroPeriod,

    #[error("poller.pool_size must be at least 1")]
    EmptyPool,

    #[error("observability.log_level '{0}' is not a log level")]
    LogLevel(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("source #{0} has an empty name")]
    EmptySourceName(usize),

    #[error("source '{0}' is declared more than once")]
    DuplicateSource(String),

    #[error("source '{0}' has an empty tcp address")]
    EmptyAddress(String),

    #[error("source '{name}' url '{url}' must start with http://")]
    UnsupportedUrl { name: String, url: String },
}

/// Check a parsed configuration, collecting every error found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.poller.period_secs == 0 {
        errors.push(ValidationError::ZeroPeriod);
    }
    if config.poller.pool_size == 0 {
        errors.push(ValidationError::EmptyPool);
    }

    let log_level = &config.observability.log_level;
    if log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::LogLevel(log_level.clone()));
    }

    let metrics_address = &config.observability.metrics_address;
    if config.observability.metrics_enabled && metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(metrics_address.clone()));
    }

    let mut seen = HashSet::new();
    for (index, source) in config.sources.iter().enumerate() {
        if source.name.trim().is_empty() {
            errors.push(ValidationError::EmptySourceName(index));
        } else if !seen.insert(source.name.as_str()) {
            errors.push(ValidationError::DuplicateSource(source.name.clone()));
        }

        match &source.probe {
            ProbeConfig::Tcp { address } if address.trim().is_empty() => {
                errors.push(ValidationError::EmptyAddress(source.name.clone()));
            }
            ProbeConfig::Http { url } if !url.starts_with("http://") => {
                errors.push(ValidationError::UnsupportedUrl {
                    name: source.name.clone(),
                    url: url.clone(),
                });
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
