//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Accept connections and serve HTTP/1.1 on each
//! - Graceful shutdown bounded by a grace period
//!
//! # Shutdown
//! ```text
//! signal → stop accepting (listener dropped)
//!        → every connection finishes its in-flight request, then closes
//!        → grace elapsed? abort the remaining connection tasks
//! ```
//!
//! Connections are owned by a `JoinSet`, so aborting them also drops the
//! handler futures they are driving. Nothing outlives `run`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::config::ServerConfig;
use crate::health::ProcessClock;
use crate::http::handlers::{self, AppState, WorkProfile};
use crate::http::request::MakeDemoRequestId;
use crate::lifecycle::ShutdownSignal;
use crate::observability::{Correlation, Emitter};

/// Routes served by [`DemoServer`].
pub const ENDPOINTS: [&str; 7] = [
    "/",
    "/api/data",
    "/api/slow",
    "/api/error",
    "/health",
    "/healthz",
    "/roll",
];

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// The demo HTTP server.
pub struct DemoServer {
    router: Router,
    config: ServerConfig,
    grace: Duration,
    emitter: Emitter,
}

impl DemoServer {
    /// Create a new HTTP server.
    ///
    /// `grace` bounds how long in-flight requests may run after shutdown is triggered.
    pub fn new(config: ServerConfig, grace: Duration, emitter: Emitter, clock: ProcessClock) -> Self {
        let state = AppState {
            server_name: Arc::from(config.server_name.as_str()),
            emitter: emitter.clone(),
            clock,
            work: WorkProfile::from(&config),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            grace,
            emitter,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request span is opened at INFO so that the default log level
    /// keeps it, and with it the trace context handlers correlate against.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::home))
            .route("/api/data", get(handlers::data))
            .route("/api/slow", get(handlers::slow))
            .route("/api/error", get(handlers::error))
            .route("/health", get(handlers::health))
            .route("/healthz", get(handlers::health))
            .route("/roll", get(handlers::roll))
            .fallback(handlers::home)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeDemoRequestId))
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO)),
                    )
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        Duration::from_secs(config.request_timeout_secs),
                    ))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// A clone of the router, for driving handlers without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain for at most the grace period.
    ///
    /// Connections still open when the grace period ends are aborted along
    /// with the requests they carry.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        let log = Correlation::none();

        self.emitter.info(
            "Server starting",
            &log,
            json!({
                "server_name": self.config.server_name,
                "address": addr.to_string(),
                "port": addr.port(),
                "endpoints": ENDPOINTS,
            }),
        );

        let drain = shutdown.clone();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => break,
                // Reap finished connections so the set stays small.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        connections.spawn(serve_connection(
                            stream,
                            remote,
                            self.router.clone(),
                            drain.clone(),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        // Stop accepting before draining.
        drop(listener);

        self.emitter.info(
            "Shutting down server",
            &log,
            json!({
                "grace_period_ms": self.grace.as_millis() as u64,
                "open_connections": connections.len(),
            }),
        );

        let drained = tokio::time::timeout(self.grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => {
                self.emitter.info("Server stopped gracefully", &log, json!(null));
            }
            Err(_) => {
                let aborted = connections.len();
                connections.abort_all();
                while connections.join_next().await.is_some() {}

                self.emitter.error(
                    "Server shutdown error",
                    &log,
                    json!({
                        "error": "grace period elapsed with requests in flight",
                        "grace_period_ms": self.grace.as_millis() as u64,
                        "aborted_connections": aborted,
                    }),
                );
            }
        }

        Ok(())
    }
}

/// Serve one HTTP/1.1 connection; on shutdown, finish the current request and close.
async fn serve_connection(
    stream: TcpStream,
    remote: SocketAddr,
    router: Router,
    mut shutdown: ShutdownSignal,
) {
    let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(remote));
        router.clone().oneshot(request)
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(peer_addr = %remote, error = %e, "Connection closed with error");
    }
}
