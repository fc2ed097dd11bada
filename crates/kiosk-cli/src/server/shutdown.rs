//! Graceful shutdown signal handling.

use std::time::Duration;

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Waits for SIGTERM or SIGINT (Ctrl+C).
///
/// Once a signal arrives the server stops accepting connections. If
/// in-flight requests have not finished after `shutdown_timeout`, the process
/// exits anyway.
pub async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %e,
                "Failed to install Ctrl+C handler"
            );
            std::future::pending::<()>().await;
        } else {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                "Received Ctrl+C signal, initiating graceful shutdown"
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    "Received SIGTERM signal, initiating graceful shutdown"
                );
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %e,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        timeout_secs = shutdown_timeout.as_secs(),
        "Graceful shutdown initiated"
    );

    tokio::spawn(async move {
        tokio::time::sleep(shutdown_timeout).await;
        tracing::warn!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            timeout_secs = shutdown_timeout.as_secs(),
            "Requests still running after the shutdown timeout, exiting"
        );
        std::process::exit(1);
    });
}
