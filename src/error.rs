//! Top-level error type.

use crate::config::ConfigError;
use crate::lifecycle::StartupError;
use crate::observability::TelemetryError;

/// Any error that ends the process with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Startup(#[from] StartupError),
}

pub type Result<T, E = DemoError> = std::result::Result<T, E>;
