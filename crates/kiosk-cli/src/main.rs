#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use kiosk_server::handler::routes;
use kiosk_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
use kiosk_server::service::ServiceState;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "kiosk_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "kiosk_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "kiosk_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting kiosk gateway"
    );

    let state = ServiceState::from_config(&cli.service)
        .await
        .context("failed to create service state")?;
    let router = create_router(state, &cli.recovery);

    server::serve(router, cli.server).await?;

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// The last layer added is the outermost:
/// 1. Recovery - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Metrics - per-request logging
/// 4. Routes - the gateway handlers
fn create_router(state: ServiceState, recovery: &RecoveryConfig) -> Router {
    routes(state.clone())
        .with_state(state)
        .with_metrics()
        .with_observability()
        .with_recovery(recovery)
}
