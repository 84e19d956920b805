//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and SIGTERM both trigger graceful shutdown.

use crate::lifecycle::Shutdown;
use crate::observability::{Correlation, Emitter};

/// Wait for the first termination signal and return its name.
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Spawn a task that triggers `shutdown` on the first termination signal.
///
/// The task also exits once shutdown has been triggered from elsewhere.
pub fn spawn_signal_handler(shutdown: Shutdown, emitter: Emitter) -> tokio::task::JoinHandle<()> {
    let mut already = shutdown.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => {
                emitter.info(
                    "Received shutdown signal",
                    &Correlation::none(),
                    serde_json::json!({ "signal": signal }),
                );
                shutdown.trigger();
            }
            _ = already.recv() => {}
        }
    })
}
