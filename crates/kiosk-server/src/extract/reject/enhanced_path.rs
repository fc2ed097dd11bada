//! Path parameter extractor with gateway error responses.

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path as AxumPath};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;

use super::sanitize_error_message;
use crate::handler::{Error, ErrorKind};

/// Drop-in replacement for [`axum::extract::Path`] that rejects with [`Error`].
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Path<T>(pub T);

impl<T> Path<T> {
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        <AxumPath<T> as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(|x| Self(x.0))
            .map_err(Into::into)
    }
}

impl From<PathRejection> for Error<'static> {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => ErrorKind::BadRequest
                .with_message("Invalid path parameter")
                .with_context(sanitize_error_message(&err.body_text())),
            PathRejection::MissingPathParams(err) => ErrorKind::NotFound
                .with_context(sanitize_error_message(&err.body_text())),
            _ => ErrorKind::InternalServerError.with_message("Path processing failed"),
        }
    }
}
