//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → poller / exporter / observability setup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the source set is fixed for the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BridgeConfig, ExportConfig, LogFormat, ObservabilityConfig, PollerConfig, ProbeConfig,
    SourceConfig,
};
pub use validation::ValidationError;
