#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod client;
mod config;
mod error;
pub mod multipart;

pub use backend::{FileMetadata, StorageBackend};
pub use client::StorageClient;
pub use config::{BackendType, Buckets, StorageConfig};
pub use error::{StorageError, StorageResult};

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "kiosk_opendal";

/// Tracing target for multipart upload operations.
pub const TRACING_TARGET_MULTIPART: &str = "kiosk_opendal::multipart";
