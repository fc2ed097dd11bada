//! Error types for archive handling.

use std::io;

/// Result type for archive operations.
pub type ArchiveResult<T, E = ArchiveError> = Result<T, E>;

/// Errors that can occur while reading, expanding or rewriting archives.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// No handler is registered for the file extension.
    #[error("unsupported archive format: '{0}'")]
    UnsupportedFormat(String),

    /// The archive container could not be parsed.
    #[error("malformed archive: {0}")]
    Malformed(String),

    /// An entry name is absolute or escapes the extraction root.
    #[error("unsafe entry path: '{0}'")]
    UnsafePath(String),

    /// No entry document was found at any candidate location.
    #[error("archive has no index document")]
    MissingIndex,

    /// Nested archives go deeper than the configured limit.
    #[error("nested archives exceed the maximum depth of {limit}")]
    DepthExceeded { limit: usize },

    /// Expanded content is larger than the configured limit.
    #[error("expanded content exceeds the limit of {limit} bytes")]
    SizeExceeded { limit: u64 },

    /// A markup document could not be rewritten.
    #[error("failed to rewrite document: {0}")]
    Rewrite(String),

    /// Scratch storage I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Creates a malformed-archive error from any displayable source.
    pub fn malformed(source: impl ToString) -> Self {
        Self::Malformed(source.to_string())
    }

    /// Returns `true` if the error was caused by the submitted archive
    /// rather than by the local environment.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Rewrite(_))
    }

    /// Returns `true` if an expansion limit was hit.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::DepthExceeded { .. } | Self::SizeExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_input_errors() {
        assert!(ArchiveError::MissingIndex.is_input_error());
        assert!(ArchiveError::malformed("bad header").is_input_error());
        assert!(ArchiveError::SizeExceeded { limit: 1 }.is_input_error());
        assert!(!ArchiveError::Io(io::Error::other("disk full")).is_input_error());
    }

    #[test]
    fn classifies_limits() {
        assert!(ArchiveError::DepthExceeded { limit: 2 }.is_limit_exceeded());
        assert!(!ArchiveError::UnsafePath("../x".into()).is_limit_exceeded());
    }
}
