//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers / traffic loops produce events:
//!     → emitter.rs (correlated event records → sink)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (trace/span ids of the active context)
//!
//! telemetry.rs wires the sinks to the outside world:
//!     → stdout JSON lines (event records)
//!     → stderr JSON (diagnostics via logging.rs)
//!     → OTLP/gRPC collector (spans, metrics, log records)
//!     → Prometheus scrape listener (optional)
//! ```
//!
//! # Design Decisions
//! - Every record carries the same correlation keys, empty when unknown
//! - Request ID flows from middleware into handler records and responses
//! - Trace context is passed explicitly as `TraceIds`, never read from globals

pub mod emitter;
pub mod logging;
pub mod metrics;
pub mod telemetry;
pub mod tracing;

pub use emitter::{
    Correlation, Emitter, EventRecord, JsonLineSink, MemorySink, RecordSink, Severity,
    TracingSink,
};
pub use telemetry::{init_telemetry, TelemetryError, TelemetryGuard};
pub use self::tracing::TraceIds;
