//! Cache of started multipart uploads.
//!
//! Entries live in a NATS key-value bucket and expire with the part URLs, so
//! an abandoned upload can be started again after `part_expire`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use kiosk_nats::kv::{KvStore, MultipartUpload, MultipartUploadsBucket, UploadKey};
use kiosk_nats::{NatsClient, Result};
use tokio::sync::OnceCell;

/// Tracing target for the upload cache.
const TRACING_TARGET: &str = "kiosk_server::service::uploads";

type UploadStore = KvStore<UploadKey, MultipartUpload, MultipartUploadsBucket>;

/// Multipart uploads keyed by their full `bucket/key` path.
///
/// The bucket is opened on first use, so creating the cache never talks to
/// NATS. Cheap to clone.
#[derive(Clone)]
pub struct UploadCache {
    nats: NatsClient,
    ttl: Duration,
    store: Arc<OnceCell<UploadStore>>,
}

impl UploadCache {
    /// Creates a cache whose entries expire after `ttl`.
    pub fn new(nats: NatsClient, ttl: Duration) -> Self {
        Self {
            nats,
            ttl,
            store: Arc::new(OnceCell::new()),
        }
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn store(&self) -> Result<&UploadStore> {
        self.store
            .get_or_try_init(|| async {
                tracing::debug!(
                    target: TRACING_TARGET,
                    ttl_secs = self.ttl.as_secs(),
                    "Opening upload cache"
                );
                self.nats.multipart_upload_store(self.ttl).await
            })
            .await
    }

    /// Returns the upload started for `path`, if it has not expired.
    pub async fn get(&self, path: &str) -> Result<Option<MultipartUpload>> {
        self.store()
            .await?
            .get_value(&UploadKey::for_path(path))
            .await
    }

    /// Remembers `upload` under its path.
    pub async fn put(&self, upload: &MultipartUpload) -> Result<()> {
        let entry = self
            .store()
            .await?
            .put(&UploadKey::for_path(&upload.path), upload)
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %upload.path,
            revision = entry.revision,
            "Cached multipart upload"
        );

        Ok(())
    }

    /// Forgets the upload started for `path`.
    pub async fn remove(&self, path: &str) -> Result<()> {
        self.store()
            .await?
            .delete(&UploadKey::for_path(path))
            .await
    }
}

impl fmt::Debug for UploadCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCache")
            .field("ttl", &self.ttl)
            .field("opened", &self.store.initialized())
            .finish_non_exhaustive()
    }
}
