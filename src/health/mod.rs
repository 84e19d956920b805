//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Process start:
//!     ProcessClock::start() (captured once in main)
//!     → injected into the HTTP handler state
//!
//! GET /health, /healthz:
//!     clock.uptime()
//!     → HealthReport { status, timestamp, uptime }
//! ```
//!
//! # Design Decisions
//! - The start instant is read-only after capture; no global
//! - Uptime is measured on the monotonic clock, so successive reports never go backwards

pub mod state;

pub use state::{HealthReport, ProcessClock};
