//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber once per process
//! - Attach the OpenTelemetry span layer and log bridge when available
//!
//! # Design Decisions
//! - JSON diagnostics on stderr; stdout is reserved for event records
//! - `RUST_LOG` wins over the configured level
//! - The OTLP log bridge ignores the exporter's own transport crates so that
//!   exporting a log never produces another log

use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::observability::telemetry::TelemetryError;

/// Directives applied to the OTLP log bridge.
const BRIDGE_FILTER: &str = "info,hyper=off,h2=off,tonic=off,tower=off,reqwest=off,opentelemetry=off";

/// Filter from `RUST_LOG`, else `<crate>=<level>,tower_http=<level>,warn`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Directives used when `RUST_LOG` is unset.
pub fn default_directives(level: &str) -> String {
    format!("telemetry_demo={level},tower_http={level},warn")
}

/// Install the global subscriber.
///
/// `tracer` adds the span layer; `logger_provider` adds the log bridge.
pub fn init_subscriber(
    level: &str,
    tracer: Option<SdkTracer>,
    logger_provider: Option<&SdkLoggerProvider>,
) -> Result<(), TelemetryError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr);

    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let bridge = logger_provider.map(|provider| {
        OpenTelemetryTracingBridge::new(provider).with_filter(EnvFilter::new(BRIDGE_FILTER))
    });

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt_layer)
        .with(otel_layer)
        .with(bridge)
        .try_init()?;

    Ok(())
}
