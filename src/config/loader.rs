//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::config::schema::{DemoConfig, LogSinkKind};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
///
/// `env` looks up a variable by name; pass `|k| std::env::var(k).ok()` in production.
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<DemoConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => DemoConfig::default(),
    };

    apply_env(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML configuration file without validating it.
pub fn load_file(path: &Path) -> Result<DemoConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay environment variables on `config`.
///
/// Empty values count as unset; unparsable values keep the current setting.
pub fn apply_env<F>(config: &mut DemoConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(mode) = var("MODE") {
        config.mode = mode.trim().to_ascii_lowercase();
    }

    // Server
    set_parsed(&mut config.server.port, var("PORT"));
    set_string(&mut config.server.server_name, var("SERVER_NAME"));
    set_parsed(&mut config.server.error_rate, var("ERROR_RATE"));

    // Client
    set_string(&mut config.client.server_url, var("SERVER_URL"));
    set_millis(&mut config.client.request_delay_ms, var("REQUEST_DELAY"));
    set_string(&mut config.client.client_name, var("CLIENT_NAME"));
    set_parsed(&mut config.client.total_requests, var("TOTAL_REQUESTS"));

    // Telemetry
    set_string(&mut config.telemetry.service_name, var("SERVICE_NAME"));
    set_string(&mut config.telemetry.otlp_endpoint, var("OTEL_EXPORTER_OTLP_ENDPOINT"));
    if let Some(enabled) = var("TELEMETRY_ENABLED").and_then(|v| parse_bool(&v)) {
        config.telemetry.enabled = enabled;
    }
    set_parsed::<LogSinkKind>(&mut config.telemetry.log_sink, var("LOG_SINK"));
    set_string(&mut config.telemetry.log_level, var("LOG_LEVEL"));
    if let Some(addr) = var("METRICS_ADDRESS") {
        config.telemetry.metrics_address = Some(addr);
    }
    set_millis(&mut config.telemetry.metric_interval_ms, var("METRIC_INTERVAL"));

    // Lifecycle
    set_millis(&mut config.lifecycle.shutdown_grace_ms, var("SHUTDOWN_GRACE_PERIOD"));
}

fn set_string(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_parsed<T: FromStr>(target: &mut T, value: Option<String>) {
    if let Some(parsed) = value.and_then(|v| v.trim().parse().ok()) {
        *target = parsed;
    }
}

fn set_millis(target: &mut u64, value: Option<String>) {
    if let Some(duration) = value.and_then(|v| parse_duration(&v)) {
        *target = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration such as `300ms`, `5s`, `1.5s` or `1m30s`.
///
/// Accepted units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A bare `0` is zero.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input == "0" {
        return Some(Duration::ZERO);
    }
    if input.is_empty() {
        return None;
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = input;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];

        total_nanos += value * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total_nanos.round() as u64))
}
