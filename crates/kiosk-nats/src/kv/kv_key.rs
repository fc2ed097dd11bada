//! Key types.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::Error;

/// Key types stored in a [`KvStore`].
///
/// [`KvStore`]: super::KvStore
pub trait KvKey: fmt::Debug + fmt::Display + FromStr + Clone + Send + Sync + 'static {}

/// Key of a cached multipart upload: the hex SHA-256 of its `bucket/key` path.
///
/// Storage paths may contain characters NATS keys do not allow, so they are
/// never used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadKey(String);

impl UploadKey {
    /// Derives the key for a storage path.
    pub fn for_path(path: &str) -> Self {
        Self(hex::encode(Sha256::digest(path.as_bytes())))
    }

    /// Returns the key as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl KvKey for UploadKey {}

impl fmt::Display for UploadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UploadKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::operation("parse_upload_key", format!("not a sha256 digest: {s}")));
        }

        Ok(Self(s.to_ascii_lowercase()))
    }
}
