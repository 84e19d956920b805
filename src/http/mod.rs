//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign request ID, extract metadata)
//!     → handlers.rs (simulated work, one event record)
//!     → response.rs (JSON body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{generate_request_id, MakeDemoRequestId, RequestMeta, X_REQUEST_ID};
pub use response::ApiResponse;
pub use server::{DemoServer, ENDPOINTS};
