//! Typed key-value stores over NATS JetStream.
//!
//! - [`KvStore`] stores JSON values under typed keys in one bucket.
//! - [`KvKey`] formats keys for storage.
//! - [`KvBucket`] names a bucket.
//!
//! ```ignore
//! let uploads = nats_client.multipart_upload_store(part_expire).await?;
//! let key = UploadKey::for_path("private/app/report.pdf");
//! if let Some(upload) = uploads.get_value(&key).await? {
//!     return Ok(upload.upload_id);
//! }
//! ```

mod kv_bucket;
mod kv_key;
mod kv_store;
mod multipart_upload;

pub use kv_bucket::{KvBucket, MultipartUploadsBucket};
pub use kv_key::{KvKey, UploadKey};
pub use kv_store::{KvEntry, KvStore, KvValue};
pub use multipart_upload::MultipartUpload;
