//! Multipart extractor with gateway error responses.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart as AxumMultipart, Request};
use axum::http::StatusCode;
use derive_more::{Deref, DerefMut, From};

use super::sanitize_error_message;
use crate::handler::{Error, ErrorKind};

/// Drop-in replacement for [`axum::extract::Multipart`] that rejects with
/// [`Error`].
#[must_use]
#[derive(Debug, Deref, DerefMut, From)]
pub struct Multipart(pub AxumMultipart);

impl Multipart {
    #[inline]
    pub fn into_inner(self) -> AxumMultipart {
        self.0
    }
}

impl<S> FromRequest<S> for Multipart
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumMultipart::from_request(req, state)
            .await
            .map(Multipart)
            .map_err(Into::into)
    }
}

impl From<MultipartRejection> for Error<'static> {
    fn from(rejection: MultipartRejection) -> Self {
        match rejection {
            MultipartRejection::InvalidBoundary(_) => ErrorKind::BadRequest
                .with_message("Invalid multipart boundary")
                .with_context("Content-Type must be 'multipart/form-data' with a boundary"),
            rejection => ErrorKind::BadRequest
                .with_message("Invalid multipart request")
                .with_context(sanitize_error_message(&rejection.body_text())),
        }
    }
}

/// Errors while reading fields. A body over the size limit is a
/// [`ErrorKind::FileLimit`].
impl From<MultipartError> for Error<'static> {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ErrorKind::FileLimit.into_error();
        }

        ErrorKind::BadRequest
            .with_message("Failed to read multipart field")
            .with_context(sanitize_error_message(&error.body_text()))
    }
}
