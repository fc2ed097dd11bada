//! Storage seams used by the publisher.
//!
//! The publisher only needs to put objects and to keep the published-archive
//! ledger; these traits let it run against the real object store and metadata
//! store in production and against in-memory fakes in tests.

use std::future::Future;

use kiosk_opendal::{StorageBackend, StorageResult};
use kiosk_postgres::model::NewPublishedArchive;
use kiosk_postgres::query::PublishedArchiveRepository;
use kiosk_postgres::{PgClient, PgResult};
use uuid::Uuid;

/// Destination of published objects.
pub trait ObjectSink: Send + Sync {
    /// Stores `body` under `key`, replacing any existing object.
    fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = StorageResult<()>> + Send;
}

/// Records of raw archives that have already been published.
pub trait ArchiveLedger: Send + Sync {
    /// Returns the id of the record stored under `path`, if any.
    fn find(&self, path: &str) -> impl Future<Output = PgResult<Option<Uuid>>> + Send;

    /// Creates a record for `path` and returns its id.
    fn create(&self, path: &str) -> impl Future<Output = PgResult<Uuid>> + Send;

    /// Removes a record.
    fn delete(&self, id: Uuid) -> impl Future<Output = PgResult<()>> + Send;
}

impl ObjectSink for StorageBackend {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
        self.write(key, body, Some(content_type)).await
    }
}

impl ArchiveLedger for PgClient {
    async fn find(&self, path: &str) -> PgResult<Option<Uuid>> {
        let mut conn = self.get_connection().await?;
        let record = conn.find_published_archive_by_path(path).await?;
        Ok(record.map(|record| record.id))
    }

    async fn create(&self, path: &str) -> PgResult<Uuid> {
        let mut conn = self.get_connection().await?;
        let record = conn
            .create_published_archive(NewPublishedArchive::new(path))
            .await?;
        Ok(record.id)
    }

    async fn delete(&self, id: Uuid) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        conn.delete_published_archive(id).await
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory stand-ins for the object store and the metadata store.

    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    use kiosk_opendal::StorageError;
    use kiosk_postgres::PgError;

    use super::*;

    /// Object store fake that can be told to reject certain keys.
    #[derive(Default)]
    pub struct MemorySink {
        objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
        puts: Mutex<HashMap<String, usize>>,
        rejected: Option<String>,
    }

    impl MemorySink {
        /// Rejects every key ending with `suffix`.
        pub fn rejecting(suffix: &str) -> Self {
            Self {
                rejected: Some(suffix.to_owned()),
                ..Self::default()
            }
        }

        pub fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }

        pub fn body(&self, key: &str) -> Option<Vec<u8>> {
            self.objects.lock().unwrap().get(key).map(|(body, _)| body.clone())
        }

        pub fn content_type(&self, key: &str) -> Option<String> {
            self.objects.lock().unwrap().get(key).map(|(_, ty)| ty.clone())
        }

        /// Number of successful puts under `key`.
        pub fn put_count(&self, key: &str) -> usize {
            self.puts.lock().unwrap().get(key).copied().unwrap_or(0)
        }
    }

    impl ObjectSink for MemorySink {
        async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
            if self.rejected.as_deref().is_some_and(|suffix| key.ends_with(suffix)) {
                return Err(StorageError::PermissionDenied(key.to_owned()));
            }

            self.objects
                .lock()
                .unwrap()
                .insert(key.to_owned(), (body, content_type.to_owned()));
            *self.puts.lock().unwrap().entry(key.to_owned()).or_default() += 1;
            Ok(())
        }
    }

    /// Metadata store fake.
    #[derive(Default)]
    pub struct MemoryLedger {
        records: Mutex<HashMap<Uuid, String>>,
        unavailable: bool,
    }

    impl MemoryLedger {
        /// A ledger whose every call fails.
        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        pub fn paths(&self) -> Vec<String> {
            let mut paths: Vec<_> = self.records.lock().unwrap().values().cloned().collect();
            paths.sort();
            paths
        }

        fn check(&self) -> PgResult<()> {
            if self.unavailable {
                return Err(PgError::Unexpected("ledger unavailable".into()));
            }
            Ok(())
        }
    }

    impl ArchiveLedger for MemoryLedger {
        async fn find(&self, path: &str) -> PgResult<Option<Uuid>> {
            self.check()?;
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .find_map(|(id, stored)| (stored == path).then_some(*id)))
        }

        async fn create(&self, path: &str) -> PgResult<Uuid> {
            self.check()?;
            let id = Uuid::now_v7();
            self.records.lock().unwrap().insert(id, path.to_owned());
            Ok(id)
        }

        async fn delete(&self, id: Uuid) -> PgResult<()> {
            self.check()?;
            self.records.lock().unwrap().remove(&id);
            Ok(())
        }
    }
}
