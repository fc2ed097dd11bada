use std::io;
use std::path::PathBuf;

use kiosk_archive::ArchiveError;
use kiosk_opendal::StorageError;
use kiosk_postgres::PgError;
use tokio::task::JoinError;

/// Failure while pushing an expanded tree and its archive to storage.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to read '{}' from scratch storage", path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Rewrite(#[from] ArchiveError),

    #[error("failed to upload '{key}'")]
    Upload {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("published archive ledger: {0}")]
    Ledger(#[from] PgError),
}

/// Failure of one ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// No format is registered for the file name's extension.
    #[error("unsupported archive type: '{0}'")]
    UnsupportedFormat(String),

    /// The archive has no entry document.
    #[error("archive has no index document")]
    MissingIndex,

    /// The archive is malformed or names entries outside its root.
    #[error("invalid archive: {0}")]
    InvalidArchive(#[source] ArchiveError),

    /// Nesting or decompressed size went past the configured limits.
    #[error("archive exceeds expansion limits: {0}")]
    LimitExceeded(#[source] ArchiveError),

    /// Expansion failed for a reason unrelated to the upload.
    #[error("failed to expand archive: {0}")]
    Unarchive(#[source] ArchiveError),

    #[error("failed to prepare scratch storage")]
    Scratch(#[source] io::Error),

    #[error("archive task failed")]
    Task(#[from] JoinError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl IngestError {
    /// Classifies a failure to locate the entry document.
    pub(crate) fn from_resolve(error: ArchiveError) -> Self {
        match error {
            ArchiveError::MissingIndex => Self::MissingIndex,
            error => Self::InvalidArchive(error),
        }
    }

    /// Classifies a failure to expand the archive.
    pub(crate) fn from_expand(error: ArchiveError) -> Self {
        if error.is_limit_exceeded() {
            Self::LimitExceeded(error)
        } else if error.is_input_error() {
            Self::InvalidArchive(error)
        } else {
            Self::Unarchive(error)
        }
    }
}
