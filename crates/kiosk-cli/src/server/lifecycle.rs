//! Server lifecycle logging.

use std::future::Future;
use std::io;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::server::{ServerError, ServerResult};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Runs `serve_fn` and logs the outcome with the server's uptime.
pub async fn serve_with_shutdown<F>(
    server_config: &ServerConfig,
    serve_fn: impl FnOnce() -> F,
) -> ServerResult<()>
where
    F: Future<Output = io::Result<()>>,
{
    let start_time = Instant::now();

    if server_config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Server bound to all interfaces - ensure firewall is configured"
        );
    }

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_config.server_addr(),
        "Server is ready and listening for connections"
    );

    let result = serve_fn().await;
    let uptime_secs = start_time.elapsed().as_secs();

    match result {
        Ok(()) => {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                uptime_secs,
                "Shutdown completed"
            );
            Ok(())
        }
        Err(err) => {
            let error = ServerError::Runtime(err);
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %error,
                uptime_secs,
                suggestion = error.suggestion(),
                "Fatal error"
            );
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serve_with_shutdown_success() {
        let config = ServerConfig::default();
        let result = serve_with_shutdown(&config, || async { Ok(()) }).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn serve_with_shutdown_handles_error() {
        let config = ServerConfig::default();
        let result =
            serve_with_shutdown(&config, || async { Err(io::Error::other("test error")) }).await;

        assert!(matches!(result, Err(ServerError::Runtime(_))));
    }
}
