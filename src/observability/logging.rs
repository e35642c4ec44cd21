//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable via `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - An unparsable level is an error rather than a silently empty filter

use thiserror::Error;
use tracing_subscriber::{
    filter::ParseError, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    EnvFilter,
};

use crate::config::LogFormat;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{level}': {source}")]
    Level {
        level: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Build the filter applied when `RUST_LOG` is unset.
fn level_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(format!("health_bridge={level},tower_http={level}")).map_err(|source| {
        LoggingError::Level {
            level: level.to_string(),
            source,
        }
    })
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Fails if `level` does not parse
/// or a global subscriber is already set.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
    }
    Ok(())
}
