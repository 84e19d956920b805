//! Background traffic loops.
//!
//! # Data Flow
//! ```text
//! client mode:
//!     generator.rs (tick every request_delay)
//!         → rotation.rs (endpoint = list[count % len])
//!         → reqwest GET → event record per outcome
//!
//! every mode:
//!     random_metrics.rs (tick every metric_interval)
//!         → OTLP up/down counter + log event
//! ```
//!
//! # Design Decisions
//! - Counters are owned by their loop; nothing is shared for writing
//! - Both loops observe the shutdown signal before every tick
//! - Request failures are logged, never retried

pub mod generator;
pub mod random_metrics;
pub mod rotation;

pub use generator::{GeneratorReport, RequestError, StopReason, TrafficGenerator};
pub use random_metrics::RandomNumberEmitter;
pub use rotation::{EndpointRotation, DEFAULT_ENDPOINTS};
