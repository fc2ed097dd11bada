//! Ingestion error to HTTP error conversion.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::service::ingest::{IngestError, PublishError};

/// Tracing target for ingestion error conversions.
const TRACING_TARGET: &str = "kiosk_server::handler::ingest";

impl From<IngestError> for HttpError<'static> {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::UnsupportedFormat(file_name) => {
                tracing::debug!(target: TRACING_TARGET, file_name = %file_name, "Unsupported archive type");
                ErrorKind::InvalidCompress.with_resource(file_name)
            }

            IngestError::MissingIndex => {
                tracing::debug!(target: TRACING_TARGET, "Archive has no index document");
                ErrorKind::InvalidIndex.into_error()
            }

            IngestError::InvalidArchive(source) => {
                tracing::warn!(target: TRACING_TARGET, error = %source, "Rejected archive");
                ErrorKind::InvalidCompress.with_context(source.to_string())
            }

            IngestError::LimitExceeded(source) => {
                tracing::warn!(target: TRACING_TARGET, error = %source, "Archive exceeds expansion limits");
                ErrorKind::ArchiveLimit.with_context(source.to_string())
            }

            IngestError::Publish(PublishError::Upload { key, source }) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    key = %key,
                    error = %source,
                    "Failed to publish archive"
                );
                ErrorKind::Unarchive.with_message("Failed to upload the expanded files")
            }

            error => {
                tracing::error!(target: TRACING_TARGET, error = %error, "Archive ingestion failed");
                ErrorKind::Unarchive.into_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kiosk_archive::ArchiveError;

    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        let error = HttpError::from(IngestError::UnsupportedFormat("a.rar".into()));
        assert_eq!(error.kind(), ErrorKind::InvalidCompress);
        assert_eq!(error.resource(), Some("a.rar"));

        let error = HttpError::from(IngestError::MissingIndex);
        assert_eq!(error.kind(), ErrorKind::InvalidIndex);

        let error = HttpError::from(IngestError::InvalidArchive(ArchiveError::UnsafePath(
            "../x".into(),
        )));
        assert_eq!(error.kind(), ErrorKind::InvalidCompress);

        let error = HttpError::from(IngestError::LimitExceeded(ArchiveError::DepthExceeded {
            limit: 8,
        }));
        assert_eq!(error.kind(), ErrorKind::ArchiveLimit);
    }

    #[test]
    fn environment_errors_are_unarchive() {
        let io = std::io::Error::other("disk full");
        let error = HttpError::from(IngestError::Scratch(io));
        assert_eq!(error.kind(), ErrorKind::Unarchive);

        let error = HttpError::from(IngestError::Publish(PublishError::Ledger(
            kiosk_postgres::PgError::Unexpected("down".into()),
        )));
        assert_eq!(error.kind(), ErrorKind::Unarchive);
        assert!(error.context().is_none());
    }
}
