//! HTTP server startup.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::{ServerError, ServerResult, shutdown_signal};

/// Binds `server_config.server_addr()` and serves `app` until a shutdown
/// signal arrives.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server fails while running.
pub async fn serve_http(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    server_config
        .validate()
        .map_err(|err| ServerError::invalid_config(&err))?;

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|source| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %source,
            "Failed to bind to address"
        );

        ServerError::BindError {
            address: server_addr.to_string(),
            source,
        }
    })?;

    let shutdown_signal = shutdown_signal(server_config.shutdown_timeout());
    serve_with_shutdown(&server_config, || async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
    })
    .await
}
