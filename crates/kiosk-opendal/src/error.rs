//! Storage error types.

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to initialize the storage backend.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// The path does not start with a configured bucket name.
    #[error("invalid bucket in path: {0}")]
    InvalidBucket(String),

    /// File or object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Signing a URL failed.
    #[error("presign failed: {0}")]
    Presign(String),

    /// The object store rejected a multipart request.
    #[error("multipart request failed: {0}")]
    Multipart(String),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new invalid bucket error.
    pub fn invalid_bucket(path: impl Into<String>) -> Self {
        Self::InvalidBucket(path.into())
    }

    /// Creates a new multipart error.
    pub fn multipart(msg: impl Into<String>) -> Self {
        Self::Multipart(msg.into())
    }

    /// Returns `true` if the object does not exist.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}
