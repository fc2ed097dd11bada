use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Serialized body of every failed request.
///
/// `code` is stable across releases and is what clients localize on;
/// `message` is an English description.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// The error name.
    pub name: Cow<'a, str>,
    /// Stable numeric error code.
    pub code: u64,
    /// Message safe for client display.
    pub message: Cow<'a, str>,
    /// The resource the error relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    /// Additional detail about the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code (not serialized).
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // Storage and upload errors
    pub const INVALID_STORAGE: Self = Self::new(
        "invalid_storage",
        100015000001,
        "The path does not name a configured bucket",
        StatusCode::BAD_REQUEST,
    );
    pub const FILE_LIMIT: Self = Self::new(
        "file_limit",
        100014020002,
        "The uploaded file exceeds the size limit",
        StatusCode::PAYLOAD_TOO_LARGE,
    );
    pub const INVALID_DEL_FILE: Self = Self::new(
        "invalid_del_file",
        100014020003,
        "The file could not be deleted",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const UPLOAD_FILE: Self = Self::new(
        "upload_file",
        100014020004,
        "The file could not be uploaded",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const DOWNLOAD: Self = Self::new(
        "download",
        100014020005,
        "The file could not be downloaded",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const INVALID_INDEX: Self = Self::new(
        "invalid_index",
        100014020006,
        "The archive has no index page",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_COMPRESS: Self = Self::new(
        "invalid_compress",
        100014020007,
        "Please upload a valid archive",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_EXIST: Self = Self::new(
        "invalid_exist",
        100014020008,
        "The file does not exist",
        StatusCode::NOT_FOUND,
    );
    pub const THUMBNAIL: Self = Self::new(
        "thumbnail",
        100014020009,
        "The image could not be scaled",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const UNARCHIVE: Self = Self::new(
        "unarchive",
        100014020010,
        "The archive could not be unpacked",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const SIGNER: Self = Self::new(
        "signer",
        100014020011,
        "The request could not be signed",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const LIST_MULTIPART: Self = Self::new(
        "list_multipart",
        100014020012,
        "The uploaded parts could not be listed",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const COMPLETE_MULTIPART: Self = Self::new(
        "complete_multipart",
        100014020013,
        "The uploaded parts could not be merged",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const ARCHIVE_LIMIT: Self = Self::new(
        "archive_limit",
        100014020014,
        "The archive expands beyond the allowed depth or size",
        StatusCode::UNPROCESSABLE_ENTITY,
    );

    // Generic errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        100014000400,
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        100014000404,
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        100014000500,
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, code: u64, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            code,
            message: Cow::Borrowed(message),
            resource: None,
            context: None,
            status,
        }
    }

    /// Sets the resource, joining it to an existing one with `/`.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        let resource = resource.into();
        self.resource = Some(match self.resource {
            Some(existing) => Cow::Owned(format!("{existing}/{resource}")),
            None => resource,
        });
        self
    }

    /// Appends to the message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = Cow::Owned(format!("{}. {}", self.message, message.into()));
        self
    }

    /// Sets the context, joining it to an existing one with `; `.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{existing}; {context}")),
            None => context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_resources_and_contexts() {
        let response = ErrorResponse::INVALID_EXIST
            .with_resource("private")
            .with_resource("app/logo.png")
            .with_context("record missing")
            .with_context("object missing");

        assert_eq!(response.resource.as_deref(), Some("private/app/logo.png"));
        assert_eq!(
            response.context.as_deref(),
            Some("record missing; object missing")
        );
    }

    #[test]
    fn appends_messages() {
        let response = ErrorResponse::BAD_REQUEST.with_message("Missing field 'path'");
        assert_eq!(
            response.message,
            "The request could not be processed due to invalid data. Missing field 'path'"
        );
    }

    #[test]
    fn serializes_code_without_status() {
        let json = serde_json::to_value(ErrorResponse::INVALID_INDEX).unwrap();

        assert_eq!(json["name"], "invalid_index");
        assert_eq!(json["code"], 100014020006u64);
        assert!(json.get("status").is_none());
        assert!(json.get("resource").is_none());
        assert!(json.get("context").is_none());
    }
}
