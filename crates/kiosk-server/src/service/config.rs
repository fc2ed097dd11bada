use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::Args;
use kiosk_archive::{BlobTemplate, ExpandLimits};
use kiosk_nats::{NatsClient, NatsConfig};
use kiosk_opendal::{StorageClient, StorageConfig};
use kiosk_postgres::{PgClient, PgClientMigrationExt, PgConfig};
use serde::{Deserialize, Serialize};

use crate::service::ingest::IngestService;
use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Largest accepted archive upload: 100 MiB.
    pub const MAX_SIZE: u64 = 100 * 1024 * 1024;

    pub const BLOB_TEMPLATE: &str = "/api/v1/fileserver/blob/{app_id}/{hash}/{file_name}";
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Largest accepted archive upload, in bytes
    #[cfg_attr(
        feature = "config",
        arg(long = "max-size", env = "MAX_SIZE", default_value_t = defaults::MAX_SIZE)
    )]
    pub max_size: u64,

    /// Directory scratch trees are expanded into (defaults to the system temp dir)
    #[cfg_attr(feature = "config", arg(long = "temp-path", env = "TEMP_PATH"))]
    pub temp_path: Option<PathBuf>,

    /// Public URL template of published files
    #[cfg_attr(
        feature = "config",
        arg(long = "blob-template", env = "BLOB_TEMPLATE", default_value = defaults::BLOB_TEMPLATE)
    )]
    pub blob_template: String,

    /// Maximum nesting of archives inside archives
    #[cfg_attr(
        feature = "config",
        arg(long = "max-depth", env = "MAX_DEPTH", default_value_t = ExpandLimits::DEFAULT_MAX_DEPTH)
    )]
    pub max_depth: usize,

    /// Maximum number of bytes one archive may expand to
    #[cfg_attr(
        feature = "config",
        arg(
            long = "max-expanded-bytes",
            env = "MAX_EXPANDED_BYTES",
            default_value_t = ExpandLimits::DEFAULT_MAX_TOTAL_BYTES
        )
    )]
    pub max_expanded_bytes: u64,

    #[cfg_attr(feature = "config", clap(flatten))]
    pub postgres: PgConfig,

    #[cfg_attr(feature = "config", clap(flatten))]
    pub nats: NatsConfig,

    #[cfg_attr(feature = "config", clap(flatten))]
    pub storage: StorageConfig,
}

impl ServiceConfig {
    /// Creates a configuration with default limits.
    pub fn new(postgres: PgConfig, nats: NatsConfig, storage: StorageConfig) -> Self {
        Self {
            max_size: defaults::MAX_SIZE,
            temp_path: None,
            blob_template: defaults::BLOB_TEMPLATE.to_owned(),
            max_depth: ExpandLimits::DEFAULT_MAX_DEPTH,
            max_expanded_bytes: ExpandLimits::DEFAULT_MAX_TOTAL_BYTES,
            postgres,
            nats,
            storage,
        }
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::config("max size must be greater than 0"));
        }

        if self.max_depth == 0 {
            return Err(Error::config("max depth must be at least 1"));
        }

        if self.max_expanded_bytes == 0 {
            return Err(Error::config("max expanded bytes must be greater than 0"));
        }

        if !self.blob_template.contains("{file_name}") {
            return Err(Error::config(
                "blob template must contain the {file_name} placeholder",
            ));
        }

        if let Some(path) = &self.temp_path
            && !path.is_dir()
        {
            return Err(Error::config(format!(
                "temp path '{}' is not a directory",
                path.display()
            )));
        }

        self.postgres
            .validate()
            .map_err(|e| Error::config("invalid postgres configuration").with_source(e))?;
        self.nats
            .validate()
            .map_err(|e| Error::config("invalid nats configuration").with_source(e))?;
        self.storage
            .validate()
            .map_err(|e| Error::config("invalid storage configuration").with_source(e))?;

        Ok(())
    }

    /// Returns the upload size limit in bytes.
    pub fn max_size(&self) -> usize {
        usize::try_from(self.max_size).unwrap_or(usize::MAX)
    }

    /// Returns the limits applied to uploads before ingestion.
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_size: self.max_size(),
        }
    }

    /// Returns the scratch root.
    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_path.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Returns the expansion limits.
    pub fn expand_limits(&self) -> ExpandLimits {
        ExpandLimits::new(self.max_depth, self.max_expanded_bytes)
    }

    /// Connects to Postgres and runs migrations.
    pub async fn connect_postgres(&self) -> Result<PgClient> {
        let pg_client = PgClient::new(self.postgres.clone()).map_err(|e| {
            Error::external("postgres", "Failed to create database client").with_source(e)
        })?;

        pg_client.run_pending_migrations().await.map_err(|e| {
            Error::external("postgres", "Failed to apply database migrations").with_source(e)
        })?;

        Ok(pg_client)
    }

    /// Connects to the NATS server.
    pub async fn connect_nats(&self) -> Result<NatsClient> {
        NatsClient::connect(self.nats.clone())
            .await
            .map_err(|e| Error::external("nats", "Failed to connect to NATS").with_source(e))
    }

    /// Creates the object store client.
    pub fn create_storage(&self) -> Result<StorageClient> {
        StorageClient::new(self.storage.clone()).map_err(|e| {
            Error::external("storage", "Failed to create storage client").with_source(e)
        })
    }

    /// Creates the ingestion service.
    pub fn create_ingest(&self) -> IngestService {
        IngestService::standard(
            self.expand_limits(),
            BlobTemplate::new(self.blob_template.clone()),
            self.scratch_dir(),
        )
    }
}

/// Limits checked by handlers before a request reaches a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted archive, in bytes.
    pub max_size: usize,
}

impl UploadLimits {
    /// Multipart framing allowed on top of `max_size`.
    const BODY_OVERHEAD: usize = 64 * 1024;

    /// Returns `true` if `len` bytes exceed the upload limit.
    #[inline]
    pub fn exceeds(&self, len: usize) -> bool {
        len > self.max_size
    }

    /// Returns the limit for whole request bodies.
    ///
    /// Slightly larger than `max_size`, so an oversized file is reported by
    /// the handler rather than cut off mid-body.
    pub fn body_limit(&self) -> usize {
        self.max_size.saturating_add(Self::BODY_OVERHEAD)
    }
}
