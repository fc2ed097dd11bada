//! Storage configuration types.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Storage service behind the buckets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// Amazon S3 or any S3-compatible service.
    #[default]
    S3,
    /// In-process memory; nothing survives a restart.
    Memory,
}

/// Object storage configuration.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "storage configurations must be used to create a storage client"]
pub struct StorageConfig {
    /// Storage service behind the buckets
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-backend", env = "STORAGE_BACKEND", value_enum, default_value = "s3")
    )]
    pub storage_backend: BackendType,

    /// Object store endpoint, including the scheme
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-endpoint", env = "STORAGE_ENDPOINT", default_value = "http://localhost:9000")
    )]
    pub storage_endpoint: String,

    /// Region used for request signing
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-region", env = "STORAGE_REGION", default_value = "us-east-1")
    )]
    pub storage_region: String,

    /// Access key id
    #[cfg_attr(feature = "config", arg(long = "storage-access-key", env = "STORAGE_ACCESS_KEY"))]
    pub storage_access_key: Option<String>,

    /// Secret access key
    #[cfg_attr(feature = "config", arg(long = "storage-secret-key", env = "STORAGE_SECRET_KEY"))]
    pub storage_secret_key: Option<String>,

    /// Bucket holding published trees and archives
    #[cfg_attr(
        feature = "config",
        arg(long = "private-bucket", env = "PRIVATE_BUCKET", default_value = "private")
    )]
    pub private_bucket: String,

    /// Publicly readable bucket
    #[cfg_attr(
        feature = "config",
        arg(long = "readable-bucket", env = "READABLE_BUCKET", default_value = "readable")
    )]
    pub readable_bucket: String,

    /// Lifetime of presigned URLs in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "url-expire-secs", env = "URL_EXPIRE_SECS", default_value = "600")
    )]
    pub url_expire_secs: u64,

    /// Lifetime of cached multipart upload ids in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "part-expire-secs", env = "PART_EXPIRE_SECS", default_value = "86400")
    )]
    pub part_expire_secs: u64,
}

impl StorageConfig {
    /// Creates an S3 configuration with default bucket names and expiries.
    pub fn new(endpoint: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            storage_backend: BackendType::S3,
            storage_endpoint: endpoint.into(),
            storage_region: region.into(),
            storage_access_key: None,
            storage_secret_key: None,
            private_bucket: "private".to_owned(),
            readable_bucket: "readable".to_owned(),
            url_expire_secs: 600,
            part_expire_secs: 86_400,
        }
    }

    /// Creates an in-memory configuration for local runs and tests.
    pub fn memory() -> Self {
        Self {
            storage_backend: BackendType::Memory,
            ..Self::new("memory://localhost", "us-east-1")
        }
    }

    /// Sets the access credentials.
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.storage_access_key = Some(access_key.into());
        self.storage_secret_key = Some(secret_key.into());
        self
    }

    /// Sets the bucket names.
    pub fn with_buckets(mut self, private: impl Into<String>, readable: impl Into<String>) -> Self {
        self.private_bucket = private.into();
        self.readable_bucket = readable.into();
        self
    }

    /// Returns the lifetime of presigned URLs.
    #[inline]
    pub fn url_expire(&self) -> Duration {
        Duration::from_secs(self.url_expire_secs)
    }

    /// Returns the lifetime of cached multipart upload ids.
    #[inline]
    pub fn part_expire(&self) -> Duration {
        Duration::from_secs(self.part_expire_secs)
    }

    /// Returns the endpoint without its scheme.
    pub fn domain(&self) -> &str {
        match self.storage_endpoint.split_once("://") {
            Some((_, rest)) => rest,
            None => &self.storage_endpoint,
        }
    }

    /// Returns the configured bucket names.
    pub fn buckets(&self) -> Buckets {
        Buckets {
            private: self.private_bucket.clone(),
            readable: self.readable_bucket.clone(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.storage_backend == BackendType::S3 {
            url::Url::parse(&self.storage_endpoint).map_err(|e| {
                StorageError::init(format!("storage_endpoint is not a valid URL: {e}"))
            })?;
        }

        for (name, bucket) in [
            ("private_bucket", &self.private_bucket),
            ("readable_bucket", &self.readable_bucket),
        ] {
            if bucket.is_empty() || bucket.contains('/') {
                return Err(StorageError::init(format!(
                    "{name} must be a non-empty name without '/'"
                )));
            }
        }

        if self.private_bucket == self.readable_bucket {
            return Err(StorageError::init("bucket names must differ"));
        }

        if self.url_expire_secs == 0 || self.part_expire_secs == 0 {
            return Err(StorageError::init("expiry durations must be positive"));
        }

        if self.storage_access_key.is_some() != self.storage_secret_key.is_some() {
            return Err(StorageError::init(
                "storage access key and secret key must be set together",
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("storage_backend", &self.storage_backend)
            .field("storage_endpoint", &self.storage_endpoint)
            .field("storage_region", &self.storage_region)
            .field("storage_access_key", &self.storage_access_key)
            .field(
                "storage_secret_key",
                &self.storage_secret_key.as_ref().map(|_| "***"),
            )
            .field("private_bucket", &self.private_bucket)
            .field("readable_bucket", &self.readable_bucket)
            .field("url_expire_secs", &self.url_expire_secs)
            .field("part_expire_secs", &self.part_expire_secs)
            .finish()
    }
}

/// The two bucket names every request path is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buckets {
    pub private: String,
    pub readable: String,
}

impl Buckets {
    /// Returns `true` if `bucket` is one of the configured names.
    #[inline]
    pub fn contains(&self, bucket: &str) -> bool {
        bucket == self.private || bucket == self.readable
    }

    /// Splits `bucket/key` at the first `/` and checks the bucket.
    pub fn split_path<'a>(&self, path: &'a str) -> StorageResult<(&'a str, &'a str)> {
        match path.split_once('/') {
            Some((bucket, key)) if self.contains(bucket) => Ok((bucket, key)),
            _ => Err(StorageError::invalid_bucket(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_strips_the_scheme() {
        let config = StorageConfig::new("https://s3.example.com:9000", "us-east-1");
        assert_eq!(config.domain(), "s3.example.com:9000");

        let config = StorageConfig::new("s3.example.com", "us-east-1");
        assert_eq!(config.domain(), "s3.example.com");
    }

    #[test]
    fn split_path_checks_the_bucket() {
        let buckets = StorageConfig::new("http://localhost:9000", "us-east-1").buckets();

        assert_eq!(
            buckets.split_path("private/app/a/b.txt").ok(),
            Some(("private", "app/a/b.txt"))
        );
        assert_eq!(buckets.split_path("readable/x").ok(), Some(("readable", "x")));
        assert!(matches!(
            buckets.split_path("other/x"),
            Err(StorageError::InvalidBucket(_))
        ));
        assert!(buckets.split_path("private").is_err());
        assert!(buckets.split_path("/private/x").is_err());
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let config = StorageConfig::new("http://localhost:9000", "us-east-1");
        assert!(config.validate().is_ok());
        assert!(StorageConfig::memory().validate().is_ok());

        assert!(config.clone().with_buckets("same", "same").validate().is_err());
        assert!(config.clone().with_buckets("a/b", "c").validate().is_err());
        assert!(StorageConfig::new("not a url", "us-east-1").validate().is_err());

        let mut half = config.clone();
        half.storage_access_key = Some("key".into());
        assert!(half.validate().is_err());
    }

    #[test]
    fn debug_hides_the_secret() {
        let config = StorageConfig::new("http://localhost:9000", "us-east-1")
            .with_credentials("AKIA", "topsecret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecret"));
    }
}
