//! Typed wrapper over a JetStream KV bucket.

use std::marker::PhantomData;
use std::time::Duration;

use async_nats::jetstream::{self, kv};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{KvBucket, KvKey};
use crate::{Error, Result, TRACING_TARGET_KV};

/// JSON values of type `V` stored under keys of type `K` in bucket `B`.
#[derive(Clone)]
pub struct KvStore<K, V, B>
where
    K: KvKey,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: KvBucket,
{
    store: kv::Store,
    _marker: PhantomData<fn() -> (K, V, B)>,
}

impl<K, V, B> KvStore<K, V, B>
where
    K: KvKey,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: KvBucket,
{
    /// Opens the bucket, creating it with `ttl` as the entry max age if missing.
    #[tracing::instrument(skip(jetstream), target = TRACING_TARGET_KV)]
    pub(crate) async fn with_ttl(jetstream: &jetstream::Context, ttl: Duration) -> Result<Self> {
        let store = match jetstream.get_key_value(B::NAME).await {
            Ok(store) => store,
            Err(_) => {
                tracing::info!(
                    target: TRACING_TARGET_KV,
                    bucket = B::NAME,
                    ttl_secs = ttl.as_secs(),
                    "Creating KV bucket"
                );

                let config = kv::Config {
                    bucket: B::NAME.to_owned(),
                    description: B::DESCRIPTION.to_owned(),
                    max_age: ttl,
                    ..Default::default()
                };

                jetstream
                    .create_key_value(config)
                    .await
                    .map_err(|e| Error::operation("kv_create", e))?
            }
        };

        Ok(Self {
            store,
            _marker: PhantomData,
        })
    }

    /// Returns the bucket name.
    #[inline]
    pub fn bucket_name(&self) -> &'static str {
        B::NAME
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn put(&self, key: &K, value: &V) -> Result<KvEntry> {
        let key = key.to_string();
        let json = serde_json::to_vec(value)?;
        let size = json.len() as u64;

        let revision = self
            .store
            .put(&key, json.into())
            .await
            .map_err(|e| Error::operation("kv_put", e))?;

        tracing::debug!(
            target: TRACING_TARGET_KV,
            bucket = B::NAME,
            key = %key,
            revision,
            size,
            "Stored value"
        );

        Ok(KvEntry { key, revision, size })
    }

    /// Fetches the entry stored under `key`.
    pub async fn get(&self, key: &K) -> Result<Option<KvValue<V>>> {
        let key = key.to_string();
        let entry = self
            .store
            .entry(&key)
            .await
            .map_err(|e| Error::operation("kv_get", e))?;

        // Deletes and purges leave a marker entry behind.
        let Some(entry) = entry.filter(|entry| matches!(entry.operation, kv::Operation::Put)) else {
            return Ok(None);
        };

        let value = serde_json::from_slice(&entry.value)?;
        Ok(Some(KvValue {
            key,
            value,
            revision: entry.revision,
        }))
    }

    /// Fetches just the value stored under `key`.
    pub async fn get_value(&self, key: &K) -> Result<Option<V>> {
        Ok(self.get(key).await?.map(|entry| entry.value))
    }

    /// Removes `key` and its history.
    pub async fn delete(&self, key: &K) -> Result<()> {
        let key = key.to_string();
        self.store
            .purge(&key)
            .await
            .map_err(|e| Error::operation("kv_delete", e))?;

        tracing::debug!(target: TRACING_TARGET_KV, bucket = B::NAME, key = %key, "Deleted key");
        Ok(())
    }
}

/// Metadata of a stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub revision: u64,
    pub size: u64,
}

/// A decoded value with its metadata.
#[derive(Debug, Clone)]
pub struct KvValue<V> {
    pub key: String,
    pub value: V,
    pub revision: u64,
}
