//! Trace context access.
//!
//! # Responsibilities
//! - Extract the active trace/span id pair from an execution context
//! - Build the OTLP tracer provider
//!
//! # Design Decisions
//! - Ids are plain hex strings; "no context" is two empty strings, not an error
//! - When the in-process pipeline is disabled (instrumentation done below the
//!   application, e.g. eBPF), spans carry no OpenTelemetry context and every
//!   lookup yields empty ids

use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::TelemetryConfig;
use crate::observability::telemetry::TelemetryError;

/// Trace and span id of the active span, empty when unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceIds {
    pub trace_id: String,
    pub span_id: String,
}

impl TraceIds {
    /// Both ids empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ids of the span attached to `cx`, if it is valid.
    pub fn from_context(cx: &Context) -> Self {
        let span = cx.span();
        let span_context = span.span_context();
        if span_context.is_valid() {
            Self {
                trace_id: span_context.trace_id().to_string(),
                span_id: span_context.span_id().to_string(),
            }
        } else {
            Self::empty()
        }
    }

    /// Ids of the OpenTelemetry span backing a `tracing` span.
    pub fn from_span(span: &tracing::Span) -> Self {
        Self::from_context(&span.context())
    }

    /// Ids of the current `tracing` span.
    pub fn current() -> Self {
        Self::from_span(&tracing::Span::current())
    }

    pub fn is_empty(&self) -> bool {
        self.trace_id.is_empty() && self.span_id.is_empty()
    }
}

/// Build the tracer provider exporting spans over OTLP/gRPC.
pub fn build_tracer_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|source| TelemetryError::Exporter {
            signal: "trace",
            source,
        })?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource)
        .build())
}
