//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the demo.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry demo.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Operating mode name (`server`, `client` or `both`).
    ///
    /// Kept as the raw string; it is resolved into a run plan at startup.
    pub mode: String,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Traffic generator settings.
    pub client: ClientConfig,

    /// Telemetry pipeline settings.
    pub telemetry: TelemetryConfig,

    /// Startup and shutdown settings.
    pub lifecycle: LifecycleConfig,
}

impl DemoConfig {
    /// Default operating mode.
    pub const DEFAULT_MODE: &'static str = "server";
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            mode: Self::DEFAULT_MODE.to_string(),
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            telemetry: TelemetryConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,

    /// Name reported in every response body.
    pub server_name: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Upper bound (exclusive) of the simulated `/api/data` processing time.
    pub data_max_ms: u64,

    /// Lower bound of the simulated `/api/slow` delay.
    pub slow_min_ms: u64,

    /// Upper bound (exclusive) of the simulated `/api/slow` delay.
    pub slow_max_ms: u64,

    /// Probability that `/api/error` answers with a 500.
    pub error_rate: f64,
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            server_name: "rust-server".to_string(),
            request_timeout_secs: 30,
            data_max_ms: 100,
            slow_min_ms: 500,
            slow_max_ms: 2500,
            error_rate: 0.30,
        }
    }
}

/// Traffic generator configuration. Read once at start, never mutated.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the target server.
    pub server_url: String,

    /// Delay between two requests, in milliseconds.
    pub request_delay_ms: u64,

    /// Identifying name sent in `User-Agent` and `X-Client-Name`.
    pub client_name: String,

    /// Total request bound (0 = unbounded).
    pub total_requests: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long the client waits for the local server in `both` mode.
    pub startup_delay_ms: u64,
}

impl ClientConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Whether a total request bound is configured.
    pub fn is_bounded(&self) -> bool {
        self.total_requests > 0
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            request_delay_ms: 5_000,
            client_name: "rust-client".to_string(),
            total_requests: 0,
            request_timeout_secs: 10,
            startup_delay_ms: 2_000,
        }
    }
}

/// Where structured event records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogSinkKind {
    /// One JSON object per line on stdout.
    #[default]
    Stdout,
    /// Forwarded as `tracing` events to the OTLP log pipeline.
    Otel,
}

impl std::str::FromStr for LogSinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogSinkKind::Stdout),
            "otel" | "otlp" => Ok(LogSinkKind::Otel),
            other => Err(format!("unknown log sink '{}'", other)),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Install the in-process OTLP pipelines. When disabled, trace context
    /// is never available to application code.
    pub enabled: bool,

    /// OTLP/gRPC collector endpoint.
    pub otlp_endpoint: String,

    /// `service.name` resource attribute and record field.
    pub service_name: String,

    /// `service.version` resource attribute.
    pub service_version: String,

    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Event record destination.
    pub log_sink: LogSinkKind,

    /// Prometheus scrape listener, disabled when unset.
    pub metrics_address: Option<String>,

    /// Random-number metric loop period in milliseconds (0 disables the loop).
    pub metric_interval_ms: u64,

    /// OTLP metric export period in milliseconds.
    pub export_interval_ms: u64,
}

impl TelemetryConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "http://coralogix-opentelemetry-collector:4317";
    pub const DEFAULT_SERVICE_NAME: &'static str = "telemetry-demo";

    pub fn metric_interval(&self) -> Option<Duration> {
        (self.metric_interval_ms > 0).then(|| Duration::from_millis(self.metric_interval_ms))
    }

    pub fn export_interval(&self) -> Duration {
        Duration::from_millis(self.export_interval_ms)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            otlp_endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            service_name: Self::DEFAULT_SERVICE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            log_sink: LogSinkKind::Stdout,
            metrics_address: None,
            metric_interval_ms: 1_000,
            export_interval_ms: 1_000,
        }
    }
}

/// Startup and shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Grace period given to in-flight requests on shutdown, in milliseconds.
    pub shutdown_grace_ms: u64,
}

impl LifecycleConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 10_000,
        }
    }
}
