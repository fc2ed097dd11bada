//! Bucket-aware entry point to the object store.

use std::sync::Arc;
use std::time::Duration;

use crate::TRACING_TARGET;
use crate::backend::StorageBackend;
use crate::config::{BackendType, Buckets, StorageConfig};
use crate::error::{StorageError, StorageResult};
use crate::multipart::MultipartClient;

/// Object store client holding one backend per configured bucket.
///
/// Cheap to clone; all clones share the same backends.
#[derive(Debug, Clone)]
pub struct StorageClient {
    inner: Arc<StorageClientInner>,
}

#[derive(Debug)]
struct StorageClientInner {
    config: StorageConfig,
    buckets: Buckets,
    private: StorageBackend,
    readable: StorageBackend,
    multipart: Option<MultipartClient>,
}

impl StorageClient {
    /// Validates the configuration and creates the bucket backends.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;

        let buckets = config.buckets();
        let private = StorageBackend::new(&config, &buckets.private)?;
        let readable = StorageBackend::new(&config, &buckets.readable)?;

        let multipart = match config.storage_backend {
            BackendType::S3 => match MultipartClient::new(&config) {
                Ok(client) => Some(client),
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        error = %err,
                        "Multipart uploads are disabled"
                    );
                    None
                }
            },
            BackendType::Memory => None,
        };

        Ok(Self {
            inner: Arc::new(StorageClientInner {
                config,
                buckets,
                private,
                readable,
                multipart,
            }),
        })
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    /// Returns the configured bucket names.
    #[inline]
    pub fn buckets(&self) -> &Buckets {
        &self.inner.buckets
    }

    /// Returns the endpoint without its scheme.
    #[inline]
    pub fn domain(&self) -> &str {
        self.inner.config.domain()
    }

    /// Returns the backend of the bucket holding published content.
    #[inline]
    pub fn private(&self) -> &StorageBackend {
        &self.inner.private
    }

    /// Returns the backend for `bucket`, if it is a configured one.
    pub fn bucket(&self, bucket: &str) -> StorageResult<&StorageBackend> {
        if bucket == self.inner.buckets.private {
            Ok(&self.inner.private)
        } else if bucket == self.inner.buckets.readable {
            Ok(&self.inner.readable)
        } else {
            Err(StorageError::invalid_bucket(bucket))
        }
    }

    /// Splits `bucket/key` and returns the bucket's backend with the key.
    pub fn resolve<'a>(&self, path: &'a str) -> StorageResult<(&StorageBackend, &'a str)> {
        let (bucket, key) = self.inner.buckets.split_path(path)?;
        Ok((self.bucket(bucket)?, key))
    }

    /// Returns the multipart client, when the backend supports one.
    pub fn multipart(&self) -> StorageResult<&MultipartClient> {
        self.inner
            .multipart
            .as_ref()
            .ok_or_else(|| StorageError::multipart("multipart uploads are not configured"))
    }

    /// Returns the lifetime of presigned URLs.
    #[inline]
    pub fn url_expire(&self) -> Duration {
        self.inner.config.url_expire()
    }

    /// Returns the lifetime of cached multipart upload ids.
    #[inline]
    pub fn part_expire(&self) -> Duration {
        self.inner.config.part_expire()
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;

    #[test]
    fn resolves_configured_buckets() {
        let client = StorageClient::new(StorageConfig::memory()).unwrap();

        let (backend, key) = client.resolve("readable/app/logo.png").unwrap();
        assert_eq!(backend.bucket(), "readable");
        assert_eq!(key, "app/logo.png");

        assert!(client.resolve("elsewhere/app/logo.png").is_err());
        assert_eq!(client.private().bucket(), "private");
    }

    #[test]
    fn memory_backend_has_no_multipart() {
        let client = StorageClient::new(StorageConfig::memory()).unwrap();
        assert!(client.multipart().is_err());
        assert_eq!(client.domain(), "localhost");
    }
}
