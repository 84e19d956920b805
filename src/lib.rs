//! Telemetry demo library.
//!
//! An HTTP server and a traffic-generating client that emit correlated
//! traces, metrics and structured logs over OTLP.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod traffic;

pub use config::DemoConfig;
pub use error::DemoError;
pub use http::DemoServer;
pub use lifecycle::{RunPlan, Shutdown};
pub use observability::Emitter;
pub use traffic::TrafficGenerator;
