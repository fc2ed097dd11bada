use serde::Serialize;

/// A presigned URL.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    pub url: String,
}

/// A started (or resumed) multipart upload.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct MultipartStarted {
    #[serde(rename = "uploadID")]
    pub upload_id: String,
}

/// Part numbers the object store holds for an upload.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct MultipartParts {
    pub parts: Vec<u32>,
}
