//! Request failures and their JSON rendering.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// The error type returned by handlers.
///
/// An [`ErrorKind`] selects the code and status; the optional parts refine
/// the rendered [`ErrorResponse`].
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    context: Option<Cow<'a, str>>,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            message: None,
            resource: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Attaches detail about what went wrong.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Appends a message to the kind's default one.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Names the resource that caused the error.
    #[inline]
    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the context if present.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the custom message if present.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the resource if present.
    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Converts this error into an owned one.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            resource: self.resource.map(|r| Cow::Owned(r.into_owned())),
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();

        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("code", &response.code)
            .field("status", &response.status);

        if let Some(ref context) = self.context {
            debug_struct.field("context", context);
        }

        if let Some(ref message) = self.message {
            debug_struct.field("custom_message", message);
        }

        if let Some(ref resource) = self.resource {
            debug_struct.field("custom_resource", resource);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();
        let message = self.message.as_deref().unwrap_or(&response.message);

        write!(
            f,
            "{} [{}] ({}): {}",
            response.name, response.code, response.status, message
        )?;

        if let Some(ref context) = self.context {
            write!(f, " - {context}")?;
        }

        if let Some(ref resource) = self.resource {
            write!(f, " [resource: {resource}]")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let mut response = self.kind.response();

        if let Some(message) = self.message {
            response = response.with_message(message);
        }

        if let Some(resource) = self.resource {
            response = response.with_resource(resource);
        }

        if let Some(context) = self.context {
            response = response.with_context(context);
        }

        response.into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type for handlers.
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Every failure a request can end with.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400: the path does not start with a configured bucket.
    InvalidStorage,
    /// 413: the upload exceeds the configured size.
    FileLimit,
    /// 500: an object could not be deleted.
    InvalidDelFile,
    /// 500: an object could not be uploaded.
    UploadFile,
    /// 500: an object could not be read back.
    Download,
    /// 400: the archive has no entry document.
    InvalidIndex,
    /// 400: unsupported or malformed archive.
    InvalidCompress,
    /// 404: no such object or record.
    InvalidExist,
    /// 500: thumbnail generation failed.
    Thumbnail,
    /// 500: expansion or publishing failed.
    Unarchive,
    /// 500: a URL could not be signed or a multipart upload started.
    Signer,
    /// 500: multipart parts could not be listed.
    ListMultipart,
    /// 500: a multipart upload could not be completed.
    CompleteMultipart,
    /// 422: the archive nests too deep or expands too large.
    ArchiveLimit,
    /// 400: the request body could not be read.
    BadRequest,
    /// 404: no such route.
    NotFound,
    /// 500: unexpected failure.
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// Converts this kind into an [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified context.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Creates an [`Error`] with the specified message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] with the specified resource.
    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Returns the HTTP status code.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the stable numeric code.
    #[inline]
    pub fn code(self) -> u64 {
        self.response().code
    }

    /// Returns the response rendered for this kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::InvalidStorage => ErrorResponse::INVALID_STORAGE,
            Self::FileLimit => ErrorResponse::FILE_LIMIT,
            Self::InvalidDelFile => ErrorResponse::INVALID_DEL_FILE,
            Self::UploadFile => ErrorResponse::UPLOAD_FILE,
            Self::Download => ErrorResponse::DOWNLOAD,
            Self::InvalidIndex => ErrorResponse::INVALID_INDEX,
            Self::InvalidCompress => ErrorResponse::INVALID_COMPRESS,
            Self::InvalidExist => ErrorResponse::INVALID_EXIST,
            Self::Thumbnail => ErrorResponse::THUMBNAIL,
            Self::Unarchive => ErrorResponse::UNARCHIVE,
            Self::Signer => ErrorResponse::SIGNER,
            Self::ListMultipart => ErrorResponse::LIST_MULTIPART,
            Self::CompleteMultipart => ErrorResponse::COMPLETE_MULTIPART,
            Self::ArchiveLimit => ErrorResponse::ARCHIVE_LIMIT,
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.response().name.as_ref())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const ALL_KINDS: [ErrorKind; 17] = [
        ErrorKind::InvalidStorage,
        ErrorKind::FileLimit,
        ErrorKind::InvalidDelFile,
        ErrorKind::UploadFile,
        ErrorKind::Download,
        ErrorKind::InvalidIndex,
        ErrorKind::InvalidCompress,
        ErrorKind::InvalidExist,
        ErrorKind::Thumbnail,
        ErrorKind::Unarchive,
        ErrorKind::Signer,
        ErrorKind::ListMultipart,
        ErrorKind::CompleteMultipart,
        ErrorKind::ArchiveLimit,
        ErrorKind::BadRequest,
        ErrorKind::NotFound,
        ErrorKind::InternalServerError,
    ];

    #[test]
    fn default_is_internal() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<u64> = ALL_KINDS.iter().map(|kind| kind.code()).collect();
        assert_eq!(codes.len(), ALL_KINDS.len());

        let names: HashSet<String> = ALL_KINDS.iter().map(|kind| kind.to_string()).collect();
        assert_eq!(names.len(), ALL_KINDS.len());
    }

    #[test]
    fn statuses_follow_the_error_family() {
        assert_eq!(ErrorKind::InvalidStorage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::FileLimit.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ErrorKind::InvalidExist.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorKind::ArchiveLimit.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorKind::Unarchive.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        for kind in ALL_KINDS {
            assert!(kind.status_code().as_u16() >= 400);
        }
    }

    #[test]
    fn builder_chaining() {
        let error = ErrorKind::InvalidExist
            .with_message("Record is missing")
            .with_resource("private/app/logo.png")
            .with_context("no published archive");

        assert_eq!(error.kind(), ErrorKind::InvalidExist);
        assert_eq!(error.message(), Some("Record is missing"));
        assert_eq!(error.resource(), Some("private/app/logo.png"));
        assert_eq!(error.context(), Some("no published archive"));

        let display = error.to_string();
        assert!(display.contains("invalid_exist"));
        assert!(display.contains("100014020008"));
        assert!(display.contains("404"));
    }

    #[test]
    fn into_static_keeps_parts() {
        let path = String::from("private/a.bin");
        let error = ErrorKind::Signer.with_resource(path.as_str()).into_static();
        drop(path);

        assert_eq!(error.resource(), Some("private/a.bin"));
    }
}
