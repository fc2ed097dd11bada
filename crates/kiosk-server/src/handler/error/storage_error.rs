//! Object store failures.
//!
//! Handlers usually pick the kind themselves, since the same backend error
//! means different things on different routes. This conversion covers the
//! cases where the backend error alone decides.

use kiosk_opendal::StorageError;

use super::http_error::{Error as HttpError, ErrorKind};

impl From<StorageError> for HttpError<'static> {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::InvalidBucket(ref path) => ErrorKind::InvalidStorage
                .with_resource(path.clone())
                .with_context(error.to_string()),
            StorageError::NotFound(_) => ErrorKind::InvalidExist.with_context(error.to_string()),
            StorageError::Presign(_) => ErrorKind::Signer.with_context(error.to_string()),
            _ => ErrorKind::InternalServerError
                .with_message("Object store request failed")
                .with_context(error.to_string()),
        }
    }
}
