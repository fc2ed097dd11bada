//! NATS connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const DEFAULT_NAME: &str = "kiosk-gateway";
const DEFAULT_MAX_RECONNECTS: usize = 10;
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Connection settings for the cache backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URL (comma-separated for clustering)
    #[cfg_attr(feature = "config", arg(long = "nats-url", env = "NATS_URL"))]
    pub nats_url: String,

    /// Authentication token
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    pub nats_token: Option<String>,

    /// Client connection name, shown in server monitoring
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-client-name", env = "NATS_CLIENT_NAME")
    )]
    pub nats_client_name: Option<String>,

    /// Connection timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT_SECS")
    )]
    pub nats_connect_timeout: Option<u64>,

    /// Maximum number of reconnection attempts (0 = unlimited)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-max-reconnects", env = "NATS_MAX_RECONNECTS")
    )]
    pub nats_max_reconnects: Option<usize>,
}

impl NatsConfig {
    /// Creates a configuration for `server_url` authenticated with `token`.
    pub fn new(server_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            nats_url: server_url.into(),
            nats_token: Some(token.into()),
            nats_client_name: None,
            nats_connect_timeout: None,
            nats_max_reconnects: None,
        }
    }

    /// Returns the client name, falling back to the default.
    #[inline]
    pub fn name(&self) -> &str {
        self.nats_client_name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    /// Returns the server URLs.
    pub fn servers(&self) -> Vec<&str> {
        self.nats_url.split(',').map(str::trim).collect()
    }

    /// Returns the connection timeout, if set.
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.nats_connect_timeout.map(Duration::from_secs)
    }

    /// Returns the base delay between reconnection attempts.
    #[inline]
    pub fn reconnect_delay(&self) -> Duration {
        DEFAULT_RECONNECT_DELAY
    }

    /// Returns the ping interval.
    #[inline]
    pub fn ping_interval(&self) -> Duration {
        DEFAULT_PING_INTERVAL
    }

    /// Returns the reconnection limit, `None` meaning unlimited.
    #[inline]
    pub fn max_reconnects(&self) -> Option<usize> {
        match self.nats_max_reconnects.unwrap_or(DEFAULT_MAX_RECONNECTS) {
            0 => None,
            max => Some(max),
        }
    }

    /// Sets the client connection name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.nats_client_name = Some(name.into());
        self
    }

    /// Sets the connection timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_connect_timeout = Some(secs);
        self
    }

    /// Sets the reconnection limit (0 for unlimited).
    #[must_use]
    pub fn with_max_reconnects(mut self, max_reconnects: usize) -> Self {
        self.nats_max_reconnects = Some(max_reconnects);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        for server in self.servers() {
            if server.is_empty() {
                return Err(Error::invalid_config("server URL cannot be empty"));
            }
            if !server.starts_with("nats://") && !server.starts_with("tls://") {
                return Err(Error::invalid_config(format!(
                    "invalid server URL format: {server}"
                )));
            }
        }

        if self.nats_token.as_deref().is_some_and(str::is_empty) {
            return Err(Error::invalid_config("token cannot be empty when set"));
        }

        Ok(())
    }
}
