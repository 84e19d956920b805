//! Telemetry pipeline setup and teardown.
//!
//! Wires the OTLP trace, metric and log pipelines to the collector, installs
//! them globally and sets up the `tracing` subscriber. Any failure here is a
//! startup failure and aborts the process.

use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{LogExporter, WithExportConfig};
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;

use crate::config::TelemetryConfig;
use crate::observability::{logging, metrics, tracing as trace_ctx};

/// Error type for telemetry setup.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP {signal} exporter: {source}")]
    Exporter {
        signal: &'static str,
        #[source]
        source: opentelemetry_otlp::ExporterBuildError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
    #[error("failed to install Prometheus exporter: {0}")]
    Prometheus(String),
    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Owns the SDK providers; flushes and shuts them down on [`TelemetryGuard::shutdown`].
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    /// Whether the in-process pipelines are installed.
    pub fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Flush pending telemetry and stop the exporters.
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Tracer provider shutdown failed");
            }
        }
        if let Some(provider) = self.meter_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Meter provider shutdown failed");
            }
        }
        if let Some(provider) = self.logger_provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("logger provider shutdown failed: {e}");
            }
        }
    }
}

/// Resource shared by all three signals.
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new(
            "service.version",
            config.service_version.clone(),
        ))
        .build()
}

fn build_logger_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkLoggerProvider, TelemetryError> {
    let exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|source| TelemetryError::Exporter {
            signal: "logs",
            source,
        })?;

    Ok(SdkLoggerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Initialize logging and, when enabled, the OTLP pipelines.
///
/// Must be called from within the Tokio runtime.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    if let Some(addr) = &config.metrics_address {
        let addr = addr
            .parse()
            .map_err(|_| TelemetryError::MetricsAddress(addr.clone()))?;
        metrics::init_prometheus(addr)?;
    }

    if !config.enabled {
        logging::init_subscriber(&config.log_level, None, None)?;
        tracing::info!(
            service_name = %config.service_name,
            "In-process telemetry disabled; trace context will not be visible to the application"
        );
        return Ok(TelemetryGuard::default());
    }

    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = build_resource(config);
    let tracer_provider = trace_ctx::build_tracer_provider(config, resource.clone())?;
    let meter_provider = metrics::build_meter_provider(config, resource.clone())?;
    let logger_provider = build_logger_provider(config, resource)?;

    let tracer = tracer_provider.tracer(config.service_name.clone());
    global::set_tracer_provider(tracer_provider.clone());
    global::set_meter_provider(meter_provider.clone());

    logging::init_subscriber(&config.log_level, Some(tracer), Some(&logger_provider))?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        tracer_provider: Some(tracer_provider),
        meter_provider: Some(meter_provider),
        logger_provider: Some(logger_provider),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_guard_is_not_exporting() {
        let guard = TelemetryGuard::default();
        assert!(!guard.is_exporting());
        guard.shutdown();
    }

    #[test]
    fn test_resource_carries_service_name() {
        let config = TelemetryConfig {
            service_name: "resource-test".to_string(),
            ..Default::default()
        };
        let resource = build_resource(&config);
        let name = resource.get(&opentelemetry::Key::new("service.name"));
        assert_eq!(name.map(|v| v.to_string()), Some("resource-test".to_string()));
    }
}
