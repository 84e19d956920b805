//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (delays > 0, probabilities in [0, 1])
//! - Check that URLs and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Mode is not checked here; it is resolved into a run plan at startup

use std::net::SocketAddr;

use crate::config::schema::DemoConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if !(0.0..=1.0).contains(&server.error_rate) {
        errors.push(ValidationError::new(
            "server.error_rate",
            format!("must be between 0 and 1, got {}", server.error_rate),
        ));
    }
    if server.slow_min_ms >= server.slow_max_ms {
        errors.push(ValidationError::new(
            "server.slow_min_ms",
            "must be lower than server.slow_max_ms",
        ));
    }
    if server.data_max_ms == 0 {
        errors.push(ValidationError::new("server.data_max_ms", "must be greater than 0"));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than 0",
        ));
    }
    if server.server_name.trim().is_empty() {
        errors.push(ValidationError::new("server.server_name", "must not be empty"));
    }

    let client = &config.client;
    if let Err(e) = url::Url::parse(&client.server_url) {
        errors.push(ValidationError::new(
            "client.server_url",
            format!("invalid URL '{}': {}", client.server_url, e),
        ));
    }
    if client.request_delay_ms == 0 {
        errors.push(ValidationError::new(
            "client.request_delay_ms",
            "must be greater than 0",
        ));
    }
    if client.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "client.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    let telemetry = &config.telemetry;
    if telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::new("telemetry.service_name", "must not be empty"));
    }
    if telemetry.enabled && telemetry.export_interval_ms == 0 {
        errors.push(ValidationError::new(
            "telemetry.export_interval_ms",
            "must be greater than 0",
        ));
    }
    if let Some(addr) = &telemetry.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "telemetry.metrics_address",
                format!("invalid socket address '{}'", addr),
            ));
        }
    }

    if config.lifecycle.shutdown_grace_ms == 0 {
        errors.push(ValidationError::new(
            "lifecycle.shutdown_grace_ms",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
