//! Telemetry demo
//!
//! An HTTP server and a traffic generator that emit correlated traces,
//! metrics and structured logs to an OpenTelemetry collector.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────── telemetry-demo ─────────────────────────┐
//!   │                                                                  │
//!   │  ┌───────────┐  GET /, /api/*, /health   ┌──────────────────┐    │
//!   │  │  traffic  │ ─────────────────────────▶│   http server    │    │
//!   │  │ generator │ ◀─────────────────────────│   (handlers)     │    │
//!   │  └─────┬─────┘        JSON replies       └────────┬─────────┘    │
//!   │        │                                          │              │
//!   │        ▼                                          ▼              │
//!   │  ┌────────────────────────────────────────────────────────────┐  │
//!   │  │ observability: emitter (stdout JSON) · tracing · metrics   │  │
//!   │  └──────────────────────────────┬─────────────────────────────┘  │
//!   │                                 │                                │
//!   │  ┌──────────────┐               │       ┌───────────────────┐    │
//!   │  │ random-number│───────────────┤       │ lifecycle         │    │
//!   │  │ metric loop  │               │       │ signals/shutdown  │    │
//!   │  └──────────────┘               │       └───────────────────┘    │
//!   └─────────────────────────────────┼────────────────────────────────┘
//!                                     ▼
//!                        OTLP/gRPC collector (traces, metrics, logs)
//! ```
//!
//! # Modes
//!
//! - `server`: HTTP server only
//! - `client`: traffic generator only; exits when it finishes
//! - `both`: server, then the client after a short start delay

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;

use telemetry_demo::config::{load_config, DemoConfig, LogSinkKind};
use telemetry_demo::error::DemoError;
use telemetry_demo::health::ProcessClock;
use telemetry_demo::lifecycle::{self, AppContext, RunPlan, Shutdown, VALID_MODES};
use telemetry_demo::observability::{
    init_telemetry, Correlation, Emitter, JsonLineSink, RecordSink, TelemetryGuard, TracingSink,
};

#[derive(Parser)]
#[command(name = "telemetry-demo")]
#[command(about = "HTTP server and client that emit correlated telemetry", long_about = None)]
struct Cli {
    /// Operating mode: server, client or both. Overrides MODE.
    mode: Option<String>,

    /// Optional TOML configuration file.
    #[arg(short, long, env = "DEMO_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet, so setup errors go straight to stderr.
    let (config, guard) = match setup(cli) {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("telemetry-demo: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let clock = ProcessClock::start();
    let emitter = build_emitter(&config);
    let log = Correlation::none();

    emitter.info(
        "Starting application",
        &log,
        json!({
            "mode": config.mode,
            "service_name": config.telemetry.service_name,
            "telemetry_enabled": config.telemetry.enabled,
        }),
    );

    let plan = match RunPlan::resolve(&config.mode) {
        Ok(plan) => plan,
        Err(_) => {
            emitter.info(
                "Invalid mode",
                &log,
                json!({ "mode": config.mode, "valid_modes": VALID_MODES }),
            );
            guard.shutdown();
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let signals = lifecycle::spawn_signal_handler(shutdown.clone(), emitter.clone());

    let ctx = AppContext {
        config,
        emitter: emitter.clone(),
        shutdown: shutdown.clone(),
        clock,
    };

    let code = match lifecycle::run(plan, ctx).await {
        Ok(summary) => {
            emitter.info(
                "Application stopped",
                &log,
                json!({
                    "mode": plan.as_str(),
                    "requests_made": summary.generator.map(|g| g.requests_made),
                    "uptime_seconds": clock.uptime().as_secs_f64(),
                }),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let e = DemoError::from(e);
            emitter.error("Fatal startup error", &log, json!({ "error": e.to_string() }));
            ExitCode::FAILURE
        }
    };

    shutdown.trigger();
    let _ = signals.await;
    guard.shutdown();
    code
}

/// Load configuration, apply the CLI mode and start the telemetry pipelines.
fn setup(cli: Cli) -> Result<(DemoConfig, TelemetryGuard), DemoError> {
    let mut config = load_config(cli.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(mode) = cli.mode {
        config.mode = mode.to_lowercase();
    }

    let guard = init_telemetry(&config.telemetry)?;
    Ok((config, guard))
}

/// Event records go to stdout as JSON lines, or through the OTLP log bridge.
fn build_emitter(config: &DemoConfig) -> Emitter {
    let sink: Arc<dyn RecordSink> = match config.telemetry.log_sink {
        LogSinkKind::Stdout => Arc::new(JsonLineSink::stdout()),
        LogSinkKind::Otel => Arc::new(TracingSink),
    };
    Emitter::new(config.telemetry.service_name.clone(), sink)
}
