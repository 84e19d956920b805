//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (MODE, PORT, SERVER_URL, ...)
//!     → validation.rs (semantic checks)
//!     → DemoConfig (validated, immutable)
//!     → handed by value / Arc to each subsystem
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults; unset or unparsable variables keep them
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_duration, ConfigError};
pub use schema::{
    ClientConfig, DemoConfig, LifecycleConfig, LogSinkKind, ServerConfig, TelemetryConfig,
};
pub use validation::ValidationError;
