//! Bucket definitions.

/// Static description of a KV bucket.
pub trait KvBucket: Clone + Send + Sync + 'static {
    /// Bucket name used in NATS KV.
    const NAME: &'static str;

    /// Human-readable description for the bucket.
    const DESCRIPTION: &'static str;
}

/// In-progress multipart uploads, keyed by storage path hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MultipartUploadsBucket;

impl KvBucket for MultipartUploadsBucket {
    const NAME: &'static str = "multipart_uploads";
    const DESCRIPTION: &'static str = "In-progress multipart upload identifiers";
}
