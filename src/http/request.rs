//! Request identification and metadata.
//!
//! # Responsibilities
//! - Generate a request ID for every inbound request lacking one
//! - Extract the fields handlers log (path, method, peer, user agent, id)
//!
//! # Design Decisions
//! - Request ID added as early as possible (outermost layer) for tracing
//! - A caller-supplied `x-request-id` is kept as-is

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generate a new request ID.
pub fn generate_request_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

/// `MakeRequestId` for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeDemoRequestId;

impl MakeRequestId for MakeDemoRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&generate_request_id())
            .ok()
            .map(RequestId::new)
    }
}

/// Per-request metadata extracted for logging.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub path: String,
    pub method: String,
    pub remote_addr: String,
    pub user_agent: String,
    pub request_id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            path: parts.uri.path().to_string(),
            method: parts.method.to_string(),
            remote_addr,
            user_agent: header("user-agent").unwrap_or_default(),
            request_id: header(X_REQUEST_ID).unwrap_or_else(generate_request_id),
        })
    }
}
