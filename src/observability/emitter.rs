//! Structured event records.
//!
//! An [`Emitter`] packages `(severity, message, correlation, data)` into one
//! [`EventRecord`] and writes it to a [`RecordSink`]. The correlation keys
//! (`trace_id`, `span_id`, `request_id`, `service_name`) are always present in
//! the serialized record, as empty strings when unknown, so consumers can rely
//! on a fixed schema whether or not in-process trace context was available.
//!
//! One write per call: no buffering, batching or retry. What happens when a
//! sink fails is up to the sink.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::observability::tracing::TraceIds;

/// Keys owned by the record itself; free-form data cannot override them.
pub const RESERVED_KEYS: [&str; 7] = [
    "timestamp",
    "level",
    "message",
    "trace_id",
    "span_id",
    "request_id",
    "service_name",
];

/// Record severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation identifiers attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub trace: TraceIds,
    pub request_id: Option<String>,
}

impl Correlation {
    /// No trace context and no request id.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(trace: TraceIds, request_id: Option<String>) -> Self {
        Self { trace, request_id }
    }

    /// Correlation for work happening inside the current `tracing` span.
    pub fn current(request_id: Option<String>) -> Self {
        Self::new(TraceIds::current(), request_id)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// One structured event. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    #[serde(serialize_with = "rfc3339_nanos")]
    timestamp: DateTime<Utc>,
    level: Severity,
    message: String,
    trace_id: String,
    span_id: String,
    request_id: String,
    service_name: String,
    #[serde(flatten)]
    data: Map<String, Value>,
}

fn rfc3339_nanos<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

impl EventRecord {
    /// Build a record stamped with the current time.
    ///
    /// `data` may be any JSON value: objects are merged into the record
    /// (reserved keys dropped), `null` adds nothing, anything else lands
    /// under a `data` key.
    pub fn new(
        level: Severity,
        message: impl Into<String>,
        correlation: &Correlation,
        service_name: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            trace_id: correlation.trace.trace_id.clone(),
            span_id: correlation.trace.span_id.clone(),
            request_id: correlation.request_id.clone().unwrap_or_default(),
            service_name: service_name.into(),
            data: into_fields(data),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Look up a free-form data field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The record as a flat JSON object.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn into_fields(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(mut map) => {
            for key in RESERVED_KEYS {
                map.remove(key);
            }
            map
        }
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}

/// Destination for event records.
pub trait RecordSink: Send + Sync {
    fn write(&self, record: &EventRecord);
}

/// Writes one JSON object per line. Write errors are dropped.
pub struct JsonLineSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl JsonLineSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> RecordSink for JsonLineSink<W> {
    fn write(&self, record: &EventRecord) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }
}

/// Forwards records as `tracing` events.
///
/// With the OpenTelemetry log bridge installed these become OTLP log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn write(&self, record: &EventRecord) {
        let data = Value::Object(record.data.clone()).to_string();
        macro_rules! forward {
            ($level:expr) => {
                tracing::event!(
                    target: "telemetry_demo::event",
                    $level,
                    trace_id = %record.trace_id,
                    span_id = %record.span_id,
                    request_id = %record.request_id,
                    service_name = %record.service_name,
                    data = %data,
                    "{}",
                    record.message
                )
            };
        }
        match record.level {
            Severity::Debug => forward!(tracing::Level::DEBUG),
            Severity::Info => forward!(tracing::Level::INFO),
            Severity::Warn => forward!(tracing::Level::WARN),
            Severity::Error => forward!(tracing::Level::ERROR),
        }
    }
}

/// Keeps every record in memory. Useful in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records written so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Records whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<EventRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.message() == message)
            .collect()
    }
}

impl RecordSink for MemorySink {
    fn write(&self, record: &EventRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
    }
}

/// Builds correlated records and hands them to a sink.
#[derive(Clone)]
pub struct Emitter {
    service_name: Arc<str>,
    sink: Arc<dyn RecordSink>,
}

impl Emitter {
    pub fn new(service_name: impl Into<String>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            service_name: Arc::from(service_name.into()),
            sink,
        }
    }

    /// Emitter writing JSON lines to stdout.
    pub fn stdout(service_name: impl Into<String>) -> Self {
        Self::new(service_name, Arc::new(JsonLineSink::stdout()))
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Build one record and write it to the sink.
    pub fn emit(&self, level: Severity, message: &str, correlation: &Correlation, data: Value) {
        let record = EventRecord::new(
            level,
            message,
            correlation,
            self.service_name.as_ref(),
            data,
        );
        self.sink.write(&record);
    }

    pub fn info(&self, message: &str, correlation: &Correlation, data: Value) {
        self.emit(Severity::Info, message, correlation, data);
    }

    pub fn warn(&self, message: &str, correlation: &Correlation, data: Value) {
        self.emit(Severity::Warn, message, correlation, data);
    }

    pub fn error(&self, message: &str, correlation: &Correlation, data: Value) {
        self.emit(Severity::Error, message, correlation, data);
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory_emitter() -> (Emitter, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Emitter::new("unit-svc", sink.clone()), sink)
    }

    #[test]
    fn test_correlation_keys_present_when_empty() {
        let (emitter, sink) = memory_emitter();
        emitter.info("hello", &Correlation::none(), Value::Null);

        let json = sink.records()[0].to_json();
        for key in ["trace_id", "span_id", "request_id"] {
            assert_eq!(json[key], json!(""), "{} should be an empty string", key);
        }
        assert_eq!(json["service_name"], json!("unit-svc"));
        assert_eq!(json["level"], json!("info"));
        assert_eq!(json["message"], json!("hello"));
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_correlation_values_carried() {
        let (emitter, sink) = memory_emitter();
        let trace = TraceIds {
            trace_id: "4bf92f3577b34da6a3ce929d0e0e4736".to_string(),
            span_id: "00f067aa0ba902b7".to_string(),
        };
        emitter.error(
            "boom",
            &Correlation::new(trace, Some("req-1".to_string())),
            json!({ "status_code": 500 }),
        );

        let record = &sink.records()[0];
        assert_eq!(record.level(), Severity::Error);
        assert_eq!(record.trace_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(record.span_id(), "00f067aa0ba902b7");
        assert_eq!(record.request_id(), "req-1");
        assert_eq!(record.field("status_code"), Some(&json!(500)));
    }

    #[test]
    fn test_reserved_keys_cannot_be_overridden() {
        let (emitter, sink) = memory_emitter();
        emitter.info(
            "real",
            &Correlation::none(),
            json!({ "message": "fake", "trace_id": "abc", "service_name": "other", "path": "/" }),
        );

        let json = sink.records()[0].to_json();
        assert_eq!(json["message"], json!("real"));
        assert_eq!(json["trace_id"], json!(""));
        assert_eq!(json["service_name"], json!("unit-svc"));
        assert_eq!(json["path"], json!("/"));
    }

    #[test]
    fn test_non_object_data_is_nested() {
        let record = EventRecord::new(
            Severity::Warn,
            "list",
            &Correlation::none(),
            "svc",
            json!(["server", "client"]),
        );
        assert_eq!(record.field("data"), Some(&json!(["server", "client"])));
    }

    #[test]
    fn test_json_line_sink_writes_one_line_per_record() {
        let sink = Arc::new(JsonLineSink::new(Vec::<u8>::new()));
        let emitter = Emitter::new("svc", sink.clone());
        emitter.info("one", &Correlation::none(), json!({ "n": 1 }));
        emitter.warn("two", &Correlation::none(), json!({ "n": 2 }));
        drop(emitter);

        let sink = Arc::try_unwrap(sink).ok().unwrap();
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["level"], json!("warn"));
        assert_eq!(second["n"], json!(2));
        assert_eq!(second["request_id"], json!(""));
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        let emitter = Emitter::new("svc", Arc::new(TracingSink));
        emitter.error("no subscriber", &Correlation::none(), json!({ "k": "v" }));
    }
}
