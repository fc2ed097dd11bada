use serde::Serialize;

/// Body of routes that only report success.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Empty {}

/// Public URL of a published archive's entry document.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct PublishedUrl {
    pub url: String,
}

/// Where clients upload to and download from.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct Domain {
    /// Object store host, without scheme.
    pub domain: String,
    /// Bucket for objects served through signed URLs.
    pub private: String,
    /// Bucket for objects readable by anyone.
    pub readable: String,
}
