//! Health status to gauge value mapping.
//!
//! Values are fixed; dashboards and alerts downstream depend on them.

use crate::health::status::HealthStatus;

pub const UP_VALUE: f64 = 1.0;
pub const DOWN_VALUE: f64 = -1.0;
pub const OUT_OF_SERVICE_VALUE: f64 = -2.0;
pub const UNKNOWN_VALUE: f64 = 3.0;

/// Encode a status as a gauge value.
pub fn encode_status(status: HealthStatus) -> f64 {
    match status {
        HealthStatus::Up => UP_VALUE,
        HealthStatus::Down => DOWN_VALUE,
        HealthStatus::OutOfService => OUT_OF_SERVICE_VALUE,
        HealthStatus::Unknown => UNKNOWN_VALUE,
    }
}
