//! HTTP server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// HTTP server configuration.
///
/// # Environment Variables
///
/// - `HOST` - Server host address (default: 127.0.0.1)
/// - `PORT` - Server port (default: 3000)
/// - `SHUTDOWN_TIMEOUT` - Graceful shutdown timeout in seconds (default: 30, max: 300)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Host address to bind the server to.
    ///
    /// Use "127.0.0.1" for localhost only, "0.0.0.0" for all interfaces.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// TCP port number for the server to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum time in seconds to wait for in-flight requests on shutdown.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,
}

/// Default host address for development.
fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

impl ServerConfig {
    /// Validates all configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 or the shutdown timeout is outside
    /// 1-300 seconds.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.port == 0 {
            return Err(anyhow!("Port must be set explicitly; 0 is not allowed."));
        }

        if self.shutdown_timeout == 0 || self.shutdown_timeout > 300 {
            return Err(anyhow!(
                "Shutdown timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.shutdown_timeout
            ));
        }

        Ok(())
    }

    /// Returns the socket address to bind.
    #[must_use]
    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the graceful shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Returns whether the server binds to every interface.
    #[must_use]
    pub const fn binds_to_all_interfaces(&self) -> bool {
        match self.host {
            IpAddr::V4(addr) => addr.is_unspecified(),
            IpAddr::V6(addr) => addr.is_unspecified(),
        }
    }

    /// Logs the configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            host = %self.host,
            port = self.port,
            shutdown_timeout_secs = self.shutdown_timeout,
            "Server configuration"
        );
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 3000,
            shutdown_timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.binds_to_all_interfaces());
    }

    #[test]
    fn rejects_bad_timeouts() {
        let config = ServerConfig {
            shutdown_timeout: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            shutdown_timeout: 301,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn detects_unspecified_hosts() {
        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ..ServerConfig::default()
        };
        assert!(config.binds_to_all_interfaces());
    }
}
