//! Timer-driven HTTP traffic generator (client mode).
//!
//! # Loop
//! ```text
//! every request_delay:
//!     shutdown observed?          → stop (Cancelled)
//!     bound set and reached?      → stop (Completed)
//!     endpoint = rotation[count % len]
//!     dispatch one GET (abandoned if shutdown fires), log outcome
//!     count += 1
//! ```
//!
//! A failed request is logged and the loop moves on to the next tick. There
//! is no retry and no backoff. A request cut short by shutdown is logged as
//! failed and still counts as made.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde_json::json;
use tokio::time::{self, MissedTickBehavior};

use crate::config::ClientConfig;
use crate::http::ApiResponse;
use crate::lifecycle::ShutdownSignal;
use crate::observability::{metrics, Correlation, Emitter};
use crate::traffic::rotation::EndpointRotation;

/// Error for a single dispatched request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("error reading response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl RequestError {
    /// Record message used when logging this failure.
    pub fn log_message(&self) -> &'static str {
        match self {
            RequestError::Transport(_) => "HTTP request failed",
            RequestError::Body(_) => "Error reading response body",
        }
    }
}

/// Body of a completed request.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// The body parsed as an API response.
    Api(ApiResponse),
    /// Anything else, kept verbatim.
    Raw(String),
}

/// A request that got a response, whatever its status.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub status: StatusCode,
    pub duration: Duration,
    pub body: ResponseBody,
}

/// Why the generator stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown was triggered.
    Cancelled,
    /// The configured request bound was reached.
    Completed,
}

/// Final report of a generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorReport {
    pub requests_made: u64,
    pub stop_reason: StopReason,
}

/// Sends requests to the target server on a fixed cadence.
pub struct TrafficGenerator {
    config: ClientConfig,
    client: reqwest::Client,
    rotation: EndpointRotation,
    emitter: Emitter,
}

impl TrafficGenerator {
    /// Create a generator cycling through the default endpoints.
    pub fn new(config: ClientConfig, emitter: Emitter) -> Result<Self, reqwest::Error> {
        Self::with_rotation(config, EndpointRotation::default(), emitter)
    }

    pub fn with_rotation(
        config: ClientConfig,
        rotation: EndpointRotation,
        emitter: Emitter,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            config,
            client,
            rotation,
            emitter,
        })
    }

    /// Run until shutdown or until the request bound is reached.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> GeneratorReport {
        let log = Correlation::none();
        let delay = self.config.request_delay();

        self.emitter.info(
            "Client starting",
            &log,
            json!({
                "client_name": self.config.client_name,
                "server_url": self.config.server_url,
                "request_delay": format!("{:?}", delay),
                "total_requests": self.config.total_requests,
            }),
        );

        let mut ticker = time::interval_at(time::Instant::now() + delay, delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut requests_made: u64 = 0;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => return self.stop(requests_made),
                _ = ticker.tick() => {}
            }

            if self.config.is_bounded() && requests_made >= self.config.total_requests {
                self.emitter.info(
                    "Client completed all requests",
                    &log,
                    json!({ "requests_completed": requests_made }),
                );
                return GeneratorReport {
                    requests_made,
                    stop_reason: StopReason::Completed,
                };
            }

            let endpoint = self.rotation.select(requests_made);
            let url = self.url_for(endpoint);
            requests_made += 1;

            let result = tokio::select! {
                biased;

                _ = shutdown.recv() => None,
                result = self.dispatch(&url, requests_made) => Some(result),
            };

            match result {
                Some(result) => self.record(endpoint, &url, requests_made, result),
                None => {
                    metrics::record_client_request(endpoint, "cancelled");
                    self.log_failure(
                        "HTTP request failed",
                        "request cancelled by shutdown",
                        &url,
                        requests_made,
                    );
                    return self.stop(requests_made);
                }
            }
        }
    }

    fn stop(&self, requests_made: u64) -> GeneratorReport {
        self.emitter.info(
            "Client stopping",
            &Correlation::none(),
            json!({ "total_requests_made": requests_made }),
        );
        GeneratorReport {
            requests_made,
            stop_reason: StopReason::Cancelled,
        }
    }

    /// Record metrics and log the result of one dispatched request.
    fn record(
        &self,
        endpoint: &str,
        url: &str,
        request_num: u64,
        result: Result<RequestOutcome, RequestError>,
    ) {
        match result {
            Ok(outcome) => {
                metrics::record_client_request(endpoint, outcome_label(outcome.status));
                self.log_outcome(url, request_num, outcome);
            }
            Err(e) => {
                metrics::record_client_request(endpoint, "error");
                self.log_failure(e.log_message(), &e.to_string(), url, request_num);
            }
        }
    }

    fn log_failure(&self, message: &str, error: &str, url: &str, request_num: u64) {
        self.emitter.error(
            message,
            &Correlation::none(),
            json!({
                "error": error,
                "url": url,
                "request_num": request_num,
                "client_name": self.config.client_name,
            }),
        );
    }

    /// Join the server URL and an endpoint path without doubling slashes.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.server_url.trim_end_matches('/'), endpoint)
    }

    /// Send one GET request and read its body.
    pub async fn dispatch(&self, url: &str, request_num: u64) -> Result<RequestOutcome, RequestError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.config.client_name)
            .header("X-Client-Name", &self.config.client_name)
            .header("X-Request-Number", request_num.to_string())
            .send()
            .await
            .map_err(RequestError::Transport)?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let text = response.text().await.map_err(RequestError::Body)?;
        let duration = start.elapsed();

        let body = match serde_json::from_str::<ApiResponse>(&text) {
            Ok(parsed) => ResponseBody::Api(parsed),
            Err(_) => ResponseBody::Raw(text),
        };

        Ok(RequestOutcome {
            status,
            duration,
            body,
        })
    }

    fn log_outcome(&self, url: &str, request_num: u64, outcome: RequestOutcome) {
        let duration_ms = outcome.duration.as_millis() as u64;
        let status_code = outcome.status.as_u16();

        match outcome.body {
            ResponseBody::Api(api) => {
                let correlation = Correlation::none().with_request_id(api.request_id.clone());
                self.emitter.info(
                    "HTTP request completed",
                    &correlation,
                    json!({
                        "request_num": request_num,
                        "url": url,
                        "status_code": status_code,
                        "duration_ms": duration_ms,
                        "server_name": api.server,
                        "response_message": api.message,
                    }),
                );
            }
            ResponseBody::Raw(body) => {
                self.emitter.info(
                    "HTTP request completed (raw response)",
                    &Correlation::none(),
                    json!({
                        "request_num": request_num,
                        "url": url,
                        "status_code": status_code,
                        "duration_ms": duration_ms,
                        "response_body": body,
                    }),
                );
            }
        }
    }
}

fn outcome_label(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "server_error"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_url_for_joins_cleanly() {
        let config = ClientConfig {
            server_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        let generator =
            TrafficGenerator::new(config, Emitter::new("t", Arc::new(MemorySink::new()))).unwrap();
        assert_eq!(generator.url_for("/api/data"), "http://localhost:8080/api/data");
    }

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(StatusCode::OK), "ok");
        assert_eq!(outcome_label(StatusCode::NOT_FOUND), "client_error");
        assert_eq!(outcome_label(StatusCode::INTERNAL_SERVER_ERROR), "server_error");
    }
}
