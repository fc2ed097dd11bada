//! Shared NATS client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_nats::{Client, ConnectOptions, jetstream};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use super::nats_config::NatsConfig;
use crate::kv::{KvBucket, KvKey, KvStore, MultipartUpload, MultipartUploadsBucket, UploadKey};
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const PING_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RECONNECT_DELAY_MS: u64 = 30_000;

/// NATS client with a JetStream context.
///
/// Cheap to clone; clones multiplex over one connection.
#[derive(Debug, Clone)]
pub struct NatsClient {
    inner: Arc<NatsClientInner>,
}

#[derive(Debug)]
struct NatsClientInner {
    client: Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsClient {
    /// Connects to the configured servers.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CONNECTION)]
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate()?;

        let connect_timeout = config.connect_timeout().unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let client = timeout(
            connect_timeout,
            async_nats::connect_with_options(config.nats_url.as_str(), connect_options(&config)),
        )
        .await
        .map_err(|_| Error::Timeout {
            timeout: connect_timeout,
        })?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let server_info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            server_host = %server_info.host,
            server_version = %server_info.version,
            "Connected to NATS"
        );

        Ok(Self::from_client(client, config))
    }

    /// Returns a client that keeps connecting in the background.
    ///
    /// Returns without waiting for the server; operations fail until the
    /// connection is up, and [`NatsClient::ping`] reports it as down.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CONNECTION)]
    pub async fn connect_lazy(config: NatsConfig) -> Result<Self> {
        config.validate()?;

        let options = connect_options(&config).retry_on_initial_connect();
        let client = async_nats::connect_with_options(config.nats_url.as_str(), options)
            .await
            .map_err(|e| Error::Connection(Box::new(e)))?;

        tracing::info!(target: TRACING_TARGET_CONNECTION, "Connecting to NATS in the background");
        Ok(Self::from_client(client, config))
    }

    fn from_client(client: Client, config: NatsConfig) -> Self {
        let jetstream = jetstream::new(client.clone());
        Self {
            inner: Arc::new(NatsClientInner {
                client,
                jetstream,
                config,
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &NatsConfig {
        &self.inner.config
    }

    /// Flushes the connection and returns the round-trip time.
    pub async fn ping(&self) -> Result<Duration> {
        if !self.is_connected() {
            return Err(Error::Connection("not connected to the server".into()));
        }

        let start = Instant::now();

        timeout(PING_TIMEOUT, self.inner.client.flush())
            .await
            .map_err(|_| Error::Timeout {
                timeout: PING_TIMEOUT,
            })?
            .map_err(|e| Error::Connection(Box::new(e)))?;

        let elapsed = start.elapsed();
        tracing::trace!(
            target: TRACING_TARGET_CLIENT,
            duration_ms = elapsed.as_millis(),
            "NATS ping successful"
        );
        Ok(elapsed)
    }

    /// Returns whether the client is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(
            self.inner.client.connection_state(),
            async_nats::connection::State::Connected
        )
    }

    /// Opens (creating if needed) a typed KV store whose entries expire after `ttl`.
    pub async fn kv_store_with_ttl<K, V, B>(&self, ttl: Duration) -> Result<KvStore<K, V, B>>
    where
        K: KvKey,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        B: KvBucket,
    {
        KvStore::with_ttl(&self.inner.jetstream, ttl).await
    }

    /// Opens the multipart upload cache with entries expiring after `part_expire`.
    pub async fn multipart_upload_store(
        &self,
        part_expire: Duration,
    ) -> Result<KvStore<UploadKey, MultipartUpload, MultipartUploadsBucket>> {
        self.kv_store_with_ttl(part_expire).await
    }
}

fn connect_options(config: &NatsConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new()
        .name(config.name())
        .ping_interval(config.ping_interval());

    if let Some(token) = &config.nats_token {
        options = options.token(token.clone());
    }
    if let Some(connect_timeout) = config.connect_timeout() {
        options = options.connection_timeout(connect_timeout);
    }
    if let Some(max_reconnects) = config.max_reconnects() {
        options = options.max_reconnects(max_reconnects);
    }

    let base_delay_ms = u64::try_from(config.reconnect_delay().as_millis()).unwrap_or(u64::MAX);
    options.reconnect_delay_callback(move |attempts| {
        let factor = 2_u64.saturating_pow(attempts.min(32) as u32);
        Duration::from_millis(base_delay_ms.saturating_mul(factor).min(MAX_RECONNECT_DELAY_MS))
    })
}
