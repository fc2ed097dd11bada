//! S3 multipart uploads.
//!
//! OpenDAL drives multipart writes internally but does not expose upload ids,
//! so clients that upload parts directly go through [`MultipartClient`].

mod client;

pub use client::{MultipartClient, Part};
