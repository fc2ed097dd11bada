//! Service layer error types.
//!
//! These errors come out of wiring the application together: loading
//! configuration, connecting to the metadata store, the cache and the object
//! store. Request failures use [`handler::Error`] instead.
//!
//! [`handler::Error`]: crate::handler::Error

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Boxed error used as the source of an [`Error`].
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type for service layer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Category of a service layer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid configuration.
    Config,
    /// A backing service could not be reached or refused the request.
    External,
    /// Scratch storage could not be prepared.
    FileSystem,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a string for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::External => "external_service",
            Self::FileSystem => "file_system",
            Self::Internal => "internal_service",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service layer error with an optional source.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    #[inline]
    fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates an error for a backing service.
    #[inline]
    pub fn external(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let message = format!("{}: {}", service.into(), message.into());
        Self::new(ErrorKind::External, message)
    }

    /// Creates a scratch storage error.
    #[inline]
    pub fn file_system(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::FileSystem, message)
    }

    /// Creates an internal error.
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl From<kiosk_nats::Error> for Error {
    fn from(err: kiosk_nats::Error) -> Self {
        Error::external("nats", err.to_string()).with_source(err)
    }
}

impl From<kiosk_postgres::PgError> for Error {
    fn from(err: kiosk_postgres::PgError) -> Self {
        Error::external("postgres", err.to_string()).with_source(err)
    }
}

impl From<kiosk_opendal::StorageError> for Error {
    fn from(err: kiosk_opendal::StorageError) -> Self {
        Error::external("storage", err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error = Error::file_system("cannot create scratch directory").with_source(source);

        assert_eq!(error.kind(), ErrorKind::FileSystem);
        assert!(StdError::source(&error).is_some());
    }

    #[test]
    fn external_errors_name_the_service() {
        let error: Error = kiosk_nats::Error::invalid_config("missing url").into();

        assert_eq!(error.kind(), ErrorKind::External);
        assert!(error.message().starts_with("nats: "));
        assert_eq!(error.to_string(), format!("external_service error: {}", error.message()));
    }

    #[test]
    fn kinds_render_as_strings() {
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::Internal.to_string(), "internal_service");
    }
}
