//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve mode → Bind listener → Spawn server / client / metric loop
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Loops stop at next tick → Server drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: listener bound before any task starts
//! - Cancellation is cooperative through one shared signal
//! - Shutdown has a grace period: open connections are aborted after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::spawn_signal_handler;
pub use startup::{run, AppContext, RunPlan, RunSummary, StartupError, VALID_MODES};
