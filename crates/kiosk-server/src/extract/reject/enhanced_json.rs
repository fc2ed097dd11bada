//! JSON extractor with gateway error responses.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json as AxumJson, OptionalFromRequest, Request};
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::sanitize_error_message;
use crate::handler::{Error, ErrorKind};

/// Drop-in replacement for [`axum::Json`] that rejects with [`Error`].
///
/// Malformed bodies, wrong field types and a missing `Content-Type` all
/// become [`ErrorKind::BadRequest`] with a short description in `context`.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extractor = <AxumJson<T> as FromRequest<S>>::from_request(req, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl<T, S> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Self as FromRequest<S>>::from_request(req, state).await {
            Ok(json) => Ok(Some(json)),
            // Client mistakes make an optional body absent.
            Err(error) if error.kind() == ErrorKind::InternalServerError => Err(error),
            Err(_) => Ok(None),
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ErrorKind::BadRequest
                .with_message("Invalid request data format")
                .with_context(sanitize_error_message(&err.body_text())),
            JsonRejection::JsonSyntaxError(err) => ErrorKind::BadRequest
                .with_message("Invalid JSON syntax in request body")
                .with_context(sanitize_error_message(&err.body_text())),
            JsonRejection::MissingJsonContentType(_) => ErrorKind::BadRequest
                .with_message("Invalid content type")
                .with_context("Content-Type must be 'application/json'"),
            JsonRejection::BytesRejection(err) => ErrorKind::BadRequest
                .with_message("Failed to read request body")
                .with_context(sanitize_error_message(&err.body_text())),
            rejection => ErrorKind::InternalServerError
                .with_message("Request processing failed")
                .with_context(sanitize_error_message(&rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct PathBody {
        path: String,
    }

    fn request(content_type: &str, body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn extracts_valid_bodies() {
        let req = request("application/json", r#"{"path":"private/a.txt"}"#);
        let Json(body) = <Json<PathBody> as FromRequest<()>>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(body.path, "private/a.txt");
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() {
        let req = request("application/json", r#"{"file":"a.txt"}"#);
        let error = <Json<PathBody> as FromRequest<()>>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), Some("Invalid request data format"));
    }

    #[tokio::test]
    async fn wrong_content_type_is_a_bad_request() {
        let req = request("text/plain", r#"{"path":"private/a.txt"}"#);
        let error = <Json<PathBody> as FromRequest<()>>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), Some("Invalid content type"));
    }

    #[tokio::test]
    async fn optional_bodies_tolerate_garbage() {
        let req = request("application/json", "{not json");
        let body = <Json<PathBody> as OptionalFromRequest<()>>::from_request(req, &())
            .await
            .unwrap();
        assert!(body.is_none());
    }
}
