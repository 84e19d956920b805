//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the configured mode into a [`RunPlan`] once
//! - Bind the listener before anything else starts (fail fast)
//! - Spawn the server, the traffic generator and the metric loop
//! - Wait for the primary tasks, then stop the auxiliary ones
//!
//! # Design Decisions
//! - Any startup error is fatal and surfaces as a [`StartupError`]
//! - Both mode delays the client so the server is listening first
//! - When the last primary task ends, shutdown is triggered so auxiliary
//!   loops stop too

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::{DemoConfig, ServerConfig};
use crate::health::ProcessClock;
use crate::http::DemoServer;
use crate::lifecycle::Shutdown;
use crate::observability::Emitter;
use crate::traffic::{GeneratorReport, RandomNumberEmitter, TrafficGenerator};

/// Accepted values for the mode setting.
pub const VALID_MODES: [&str; 3] = ["server", "client", "both"];

/// Startup failures. All of them end the process with exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid mode '{0}' (valid modes: server, client, both)")]
    InvalidMode(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Set of concurrent tasks selected by the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPlan {
    Server,
    Client,
    Both,
}

impl RunPlan {
    /// Resolve a mode name. Matching is case-insensitive and ignores surrounding whitespace.
    pub fn resolve(mode: &str) -> Result<Self, StartupError> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(RunPlan::Server),
            "client" => Ok(RunPlan::Client),
            "both" => Ok(RunPlan::Both),
            _ => Err(StartupError::InvalidMode(mode.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunPlan::Server => "server",
            RunPlan::Client => "client",
            RunPlan::Both => "both",
        }
    }

    pub fn runs_server(&self) -> bool {
        matches!(self, RunPlan::Server | RunPlan::Both)
    }

    pub fn runs_client(&self) -> bool {
        matches!(self, RunPlan::Client | RunPlan::Both)
    }
}

/// Everything the tasks share, built once in `main`.
pub struct AppContext {
    pub config: DemoConfig,
    pub emitter: Emitter,
    pub shutdown: Shutdown,
    pub clock: ProcessClock,
}

/// What the run produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Generator report; `None` when no client ran or it was cancelled before starting.
    pub generator: Option<GeneratorReport>,
    pub random_numbers_emitted: u64,
}

/// Bind the server listener.
pub async fn bind_listener(config: &ServerConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

/// Run the tasks of `plan` until they finish or shutdown is triggered.
pub async fn run(plan: RunPlan, ctx: AppContext) -> Result<RunSummary, StartupError> {
    let AppContext {
        config,
        emitter,
        shutdown,
        clock,
    } = ctx;

    let server_task = if plan.runs_server() {
        let listener = bind_listener(&config.server).await?;
        let server = DemoServer::new(
            config.server.clone(),
            config.lifecycle.shutdown_grace(),
            emitter.clone(),
            clock,
        );
        Some(tokio::spawn(server.run(listener, shutdown.subscribe())))
    } else {
        None
    };

    let client_task = if plan.runs_client() {
        let generator = TrafficGenerator::new(config.client.clone(), emitter.clone())?;
        let startup_delay = match plan {
            RunPlan::Both => config.client.startup_delay(),
            _ => Duration::ZERO,
        };
        Some(spawn_client(generator, startup_delay, &shutdown))
    } else {
        None
    };

    let metric_task = config
        .telemetry
        .metric_interval()
        .map(|interval| tokio::spawn(RandomNumberEmitter::new(interval).run(shutdown.subscribe())));

    let server_done = async {
        let Some(handle) = server_task else {
            return Ok(());
        };
        let result = match handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(StartupError::Server(e)),
            Err(e) => Err(StartupError::Task(e)),
        };
        if result.is_err() {
            shutdown.trigger();
        }
        result
    };

    let client_done = async {
        let Some(handle) = client_task else {
            return Ok(None);
        };
        let report = handle.await?;
        // A client-only process has nothing left to do.
        if plan == RunPlan::Client {
            shutdown.trigger();
        }
        Ok::<_, StartupError>(report)
    };

    let (server_result, client_result) = tokio::join!(server_done, client_done);

    // Primaries are done; stop the auxiliary loops.
    shutdown.trigger();
    let random_numbers_emitted = match metric_task {
        Some(handle) => handle.await?,
        None => 0,
    };

    server_result?;
    let generator = client_result?;

    tracing::debug!(
        mode = plan.as_str(),
        requests_made = generator.map(|g| g.requests_made),
        random_numbers_emitted,
        "All tasks finished"
    );

    Ok(RunSummary {
        generator,
        random_numbers_emitted,
    })
}

/// Spawn the generator after an optional, cancellable start delay.
fn spawn_client(
    generator: TrafficGenerator,
    startup_delay: Duration,
    shutdown: &Shutdown,
) -> JoinHandle<Option<GeneratorReport>> {
    let mut signal = shutdown.subscribe();
    tokio::spawn(async move {
        if !startup_delay.is_zero() {
            tokio::select! {
                _ = signal.recv() => return None,
                _ = tokio::time::sleep(startup_delay) => {}
            }
        }
        Some(generator.run(signal).await)
    })
}
