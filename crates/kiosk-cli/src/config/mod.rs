//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig       # Host, port, shutdown
//! ├── recovery: RecoveryConfig   # Request timeout
//! └── service: ServiceConfig     # Limits, Postgres, NATS, object store
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
use kiosk_server::middleware::RecoveryConfig;
use kiosk_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "kiosk")]
#[command(about = "Archive ingestion gateway")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Request timeout configuration.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,

    /// Upload limits and backing service configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;

        if self.recovery.request_timeout == 0 {
            anyhow::bail!("request timeout must be at least 1 second");
        }

        Ok(())
    }

    /// Logs configuration (no credentials).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            max_size = self.service.max_size,
            max_depth = self.service.max_depth,
            max_expanded_bytes = self.service.max_expanded_bytes,
            scratch_dir = %self.service.scratch_dir().display(),
            blob_template = %self.service.blob_template,
            "Ingestion configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            postgres_url = %self.service.postgres.database_url_masked(),
            postgres_max_connections = self.service.postgres.postgres_max_connections,
            nats_servers = ?self.service.nats.servers(),
            storage_domain = %self.service.storage.domain(),
            "Backing service configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
