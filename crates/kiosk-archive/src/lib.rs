#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod digest;
mod encoding;
mod error;
mod expand;
mod format;
mod locator;
mod resolve;
mod rewrite;

#[cfg(test)]
mod testing;

pub use crate::digest::content_hash;
pub use crate::encoding::{is_noise, repair_name};
pub use crate::error::{ArchiveError, ArchiveResult};
pub use crate::expand::{EntryKind, ExpandLimits, ExpandedTree, Expander, TreeEntry};
pub use crate::format::{ArchiveEntry, ArchiveFormat, FormatRegistry, Visit, ZipFormat};
pub use crate::locator::{BlobLocator, BlobTemplate, archive_storage_path, file_extension};
pub use crate::resolve::{INDEX_NAMES, resolve_index};
pub use crate::rewrite::{LinkRewriter, is_html_document, is_local_reference, resolve_reference};

/// Tracing target for archive expansion.
pub const TRACING_TARGET_EXPAND: &str = "kiosk_archive::expand";

/// Tracing target for entry-document resolution.
pub const TRACING_TARGET_RESOLVE: &str = "kiosk_archive::resolve";

/// Tracing target for link rewriting.
pub const TRACING_TARGET_REWRITE: &str = "kiosk_archive::rewrite";
