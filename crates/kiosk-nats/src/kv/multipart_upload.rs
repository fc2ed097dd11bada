use serde::{Deserialize, Serialize};

/// A multipart upload that has been started on the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartUpload {
    /// Identifier returned by the object store.
    pub upload_id: String,
    /// `bucket/key` path the upload targets.
    pub path: String,
    /// Content type the upload was created with.
    pub content_type: String,
}

impl MultipartUpload {
    /// Creates a new cache entry.
    pub fn new(
        upload_id: impl Into<String>,
        path: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            upload_id: upload_id.into(),
            path: path.into(),
            content_type: content_type.into(),
        }
    }
}
