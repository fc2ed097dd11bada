//! Storage backend implementation.

use std::time::Duration;

use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::{BackendType, StorageConfig};
use crate::error::{StorageError, StorageResult};

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub last_modified: Option<jiff::Timestamp>,
    pub content_type: Option<String>,
}

/// One bucket of the object store, wrapping an OpenDAL operator.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    bucket: String,
}

impl StorageBackend {
    /// Creates a backend for `bucket` from configuration.
    pub fn new(config: &StorageConfig, bucket: &str) -> StorageResult<Self> {
        let operator = Self::create_operator(config, bucket)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = ?config.storage_backend,
            bucket = %bucket,
            "Storage backend initialized"
        );

        Ok(Self {
            operator,
            bucket: bucket.to_owned(),
        })
    }

    /// Returns the bucket this backend serves.
    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Reads an object.
    pub async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %self.bucket,
            path = %path,
            "Reading object"
        );

        let data = self.operator.read(path).await?.to_vec();

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "Object read complete"
        );

        Ok(data)
    }

    /// Writes an object, tagging it with `content_type` when given.
    pub async fn write(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %self.bucket,
            path = %path,
            size = data.len(),
            "Writing object"
        );

        match content_type {
            Some(content_type) => {
                self.operator
                    .write_with(path, data)
                    .content_type(content_type)
                    .await?;
            }
            None => {
                self.operator.write(path, data).await?;
            }
        }

        Ok(())
    }

    /// Deletes an object. Deleting a missing object succeeds.
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %self.bucket,
            path = %path,
            "Deleting object"
        );

        self.operator.delete(path).await?;
        Ok(())
    }

    /// Checks if an object exists.
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.operator.exists(path).await?)
    }

    /// Gets metadata for an object.
    pub async fn stat(&self, path: &str) -> StorageResult<FileMetadata> {
        let meta = self.operator.stat(path).await?;

        let last_modified = meta
            .last_modified()
            .and_then(|dt| jiff::Timestamp::from_second(dt.timestamp()).ok());

        Ok(FileMetadata {
            size: meta.content_length(),
            last_modified,
            content_type: meta.content_type().map(|s| s.to_string()),
        })
    }

    /// Returns a URL that downloads `path` until `expire` elapses.
    ///
    /// `disposition` overrides the `Content-Disposition` of the response.
    pub async fn presign_read(
        &self,
        path: &str,
        expire: Duration,
        disposition: Option<&str>,
    ) -> StorageResult<String> {
        let request = match disposition {
            Some(disposition) => {
                self.operator
                    .presign_read_with(path, expire)
                    .override_content_disposition(disposition)
                    .await
            }
            None => self.operator.presign_read(path, expire).await,
        }
        .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    /// Returns a URL that uploads `path` until `expire` elapses.
    pub async fn presign_write(&self, path: &str, expire: Duration) -> StorageResult<String> {
        let request = self
            .operator
            .presign_write(path, expire)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    /// Creates an OpenDAL operator based on configuration.
    #[allow(unreachable_patterns)]
    fn create_operator(config: &StorageConfig, bucket: &str) -> StorageResult<Operator> {
        match config.storage_backend {
            #[cfg(feature = "s3")]
            BackendType::S3 => {
                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .region(&config.storage_region)
                    .endpoint(&config.storage_endpoint);

                if let Some(ref access_key_id) = config.storage_access_key {
                    builder = builder.access_key_id(access_key_id);
                }

                if let Some(ref secret_access_key) = config.storage_secret_key {
                    builder = builder.secret_access_key(secret_access_key);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            #[cfg(feature = "memory")]
            BackendType::Memory => Operator::new(services::Memory::default())
                .map(|op| op.finish())
                .map_err(|e| StorageError::init(e.to_string())),

            other => Err(StorageError::init(format!(
                "storage backend {other:?} is not compiled in"
            ))),
        }
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("bucket", &self.bucket)
            .field("scheme", &self.operator.info().scheme())
            .finish()
    }
}
