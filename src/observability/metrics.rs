//! Metrics collection and exposition.
//!
//! # Metrics
//! - `demo_http_requests_total` (counter): handled requests by path, status
//! - `demo_http_request_duration_seconds` (histogram): handler latency by path
//! - `demo_client_requests_total` (counter): generator requests by endpoint, outcome
//! - `latest_random_number` (OTLP up/down counter): see `traffic::random_metrics`
//!
//! # Design Decisions
//! - Request metrics go through the `metrics` facade; they are no-ops until a
//!   recorder is installed (Prometheus listener when configured)
//! - OTLP metrics use an OpenTelemetry meter provider with a periodic reader

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry_otlp::{MetricExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;

use crate::config::TelemetryConfig;
use crate::observability::telemetry::TelemetryError;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_prometheus(addr: SocketAddr) -> Result<(), TelemetryError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::Prometheus(e.to_string()))?;

    tracing::info!(address = %addr, "Prometheus metrics listener started");
    Ok(())
}

/// Build the meter provider exporting over OTLP/gRPC.
pub fn build_meter_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    let exporter = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|source| TelemetryError::Exporter {
            signal: "metrics",
            source,
        })?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(config.export_interval())
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}

/// Record a request handled by the server.
pub fn record_request(path: &str, status: u16, start: Instant) {
    let path = path.to_string();
    metrics::counter!(
        "demo_http_requests_total",
        "path" => path.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("demo_http_request_duration_seconds", "path" => path)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request dispatched by the traffic generator.
pub fn record_client_request(endpoint: &str, outcome: &'static str) {
    metrics::counter!(
        "demo_client_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
