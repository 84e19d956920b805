//! Request handlers.
//!
//! Each handler does a trivial unit of work, emits exactly one event record
//! describing the outcome and writes one JSON response. Handlers share no
//! mutable state; the process clock is read-only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use serde_json::json;

use crate::config::ServerConfig;
use crate::health::ProcessClock;
use crate::http::request::RequestMeta;
use crate::http::response::ApiResponse;
use crate::observability::{metrics, Correlation, Emitter};

/// Simulated work profile of the handlers.
#[derive(Debug, Clone, Copy)]
pub struct WorkProfile {
    pub data_max_ms: u64,
    pub slow_min_ms: u64,
    pub slow_max_ms: u64,
    pub error_rate: f64,
}

impl From<&ServerConfig> for WorkProfile {
    fn from(config: &ServerConfig) -> Self {
        Self {
            data_max_ms: config.data_max_ms,
            slow_min_ms: config.slow_min_ms,
            slow_max_ms: config.slow_max_ms,
            error_rate: config.error_rate,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub server_name: Arc<str>,
    pub emitter: Emitter,
    pub clock: ProcessClock,
    pub work: WorkProfile,
}

fn correlation(meta: &RequestMeta) -> Correlation {
    Correlation::current(Some(meta.request_id.clone()))
}

/// Draw from `[min, max)`, or `min` when the range is empty.
fn draw_millis(min: u64, max: u64) -> Duration {
    let ms = if max > min { fastrand::u64(min..max) } else { min };
    Duration::from_millis(ms)
}

/// Decide whether the error endpoint fails this time.
pub fn inject_failure<R: Rng + ?Sized>(rng: &mut R, error_rate: f64) -> bool {
    rng.gen_bool(error_rate.clamp(0.0, 1.0))
}

/// `GET /` and any unmatched path.
pub async fn home(State(state): State<AppState>, meta: RequestMeta) -> Response {
    let start = Instant::now();
    let response = ApiResponse::new("Hello from Rust Server!", &state.server_name, &meta.request_id);

    state.emitter.info(
        "HTTP request served",
        &correlation(&meta),
        json!({
            "path": meta.path,
            "method": meta.method,
            "remote_addr": meta.remote_addr,
            "user_agent": meta.user_agent,
        }),
    );

    metrics::record_request("/", StatusCode::OK.as_u16(), start);
    response.into_response()
}

/// `GET /api/data`: short simulated processing.
pub async fn data(State(state): State<AppState>, meta: RequestMeta) -> Response {
    let start = Instant::now();
    let processing = draw_millis(0, state.work.data_max_ms);
    tokio::time::sleep(processing).await;

    let response = ApiResponse::new("Data from Rust Server API", &state.server_name, &meta.request_id);

    state.emitter.info(
        "API data request served",
        &correlation(&meta),
        json!({
            "path": meta.path,
            "method": meta.method,
            "remote_addr": meta.remote_addr,
            "processing_ms": processing.as_millis() as u64,
        }),
    );

    metrics::record_request("/api/data", StatusCode::OK.as_u16(), start);
    response.into_response()
}

/// `GET /api/slow`: long simulated delay.
pub async fn slow(State(state): State<AppState>, meta: RequestMeta) -> Response {
    let start = Instant::now();
    let delay = draw_millis(state.work.slow_min_ms, state.work.slow_max_ms);
    tokio::time::sleep(delay).await;

    let response = ApiResponse::new(
        format!("Slow response (took {:?})", delay),
        &state.server_name,
        &meta.request_id,
    );

    state.emitter.info(
        "Slow request served",
        &correlation(&meta),
        json!({
            "path": meta.path,
            "method": meta.method,
            "remote_addr": meta.remote_addr,
            "delay_ms": delay.as_millis() as u64,
        }),
    );

    metrics::record_request("/api/slow", StatusCode::OK.as_u16(), start);
    response.into_response()
}

/// `GET /api/error`: fails with a 500 at the configured rate.
pub async fn error(State(state): State<AppState>, meta: RequestMeta) -> Response {
    let start = Instant::now();
    let failed = inject_failure(&mut rand::thread_rng(), state.work.error_rate);

    let (status, message) = if failed {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    } else {
        (StatusCode::OK, "Success response")
    };
    let response = ApiResponse::new(message, &state.server_name, &meta.request_id);
    let fields = json!({
        "path": meta.path,
        "method": meta.method,
        "remote_addr": meta.remote_addr,
        "status_code": status.as_u16(),
    });

    if failed {
        state
            .emitter
            .error("Error endpoint returned 500", &correlation(&meta), fields);
    } else {
        state
            .emitter
            .info("Error endpoint returned success", &correlation(&meta), fields);
    }

    metrics::record_request("/api/error", status.as_u16(), start);
    response.with_status(status)
}

/// `GET /health` and `GET /healthz`.
pub async fn health(State(state): State<AppState>, meta: RequestMeta) -> Response {
    let start = Instant::now();
    let report = state.clock.report();

    state.emitter.info(
        "Health check requested",
        &correlation(&meta),
        json!({
            "path": meta.path,
            "method": meta.method,
            "remote_addr": meta.remote_addr,
            "uptime": report.uptime,
            "status": report.status,
        }),
    );

    metrics::record_request("/health", StatusCode::OK.as_u16(), start);
    Json(report).into_response()
}

/// `GET /roll`: roll a die inside a child span.
pub async fn roll(State(state): State<AppState>, meta: RequestMeta) -> Response {
    let start = Instant::now();
    let roll = roll_dice();

    let response = ApiResponse::new(format!("rolled a {}", roll), &state.server_name, &meta.request_id);

    state.emitter.info(
        "Dice roll handled",
        &correlation(&meta),
        json!({
            "path": meta.path,
            "method": meta.method,
            "remote_addr": meta.remote_addr,
            "roll_result": roll,
        }),
    );

    metrics::record_request("/roll", StatusCode::OK.as_u16(), start);
    response.into_response()
}

fn roll_dice() -> u8 {
    let span = tracing::info_span!("roll-dice", dice.roll = tracing::field::Empty);
    let _entered = span.enter();
    let roll = fastrand::u8(1..=6);
    span.record("dice.roll", roll);
    roll
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_inject_failure_rate_is_about_thirty_percent() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = 20_000;
        let failures = (0..samples)
            .filter(|_| inject_failure(&mut rng, 0.30))
            .count();
        let ratio = failures as f64 / samples as f64;
        assert!((0.28..0.32).contains(&ratio), "ratio was {}", ratio);
    }

    #[test]
    fn test_inject_failure_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..100).all(|_| inject_failure(&mut rng, 1.0)));
        assert!((0..100).all(|_| !inject_failure(&mut rng, 0.0)));
        // Out-of-range rates are clamped rather than panicking.
        assert!(inject_failure(&mut rng, 7.0));
    }

    #[test]
    fn test_draw_millis_bounds() {
        for _ in 0..1_000 {
            let d = draw_millis(500, 2500);
            assert!(d >= Duration::from_millis(500) && d < Duration::from_millis(2500));
        }
        assert_eq!(draw_millis(10, 10), Duration::from_millis(10));
    }

    #[test]
    fn test_roll_dice_range() {
        for _ in 0..200 {
            let roll = roll_dice();
            assert!((1..=6).contains(&roll));
        }
    }
}
