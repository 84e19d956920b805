//! Response bodies.
//!
//! Every API endpoint answers with an [`ApiResponse`]; the health endpoints
//! answer with a [`crate::health::HealthReport`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON body returned by the API endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub server: String,
    pub request_id: String,
}

impl ApiResponse {
    pub fn new(message: impl Into<String>, server: &str, request_id: &str) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            server: server.to_string(),
            request_id: request_id.to_string(),
        }
    }

    /// Pair the body with a status code.
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}
