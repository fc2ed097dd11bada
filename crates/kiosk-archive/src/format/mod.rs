//! Archive format handlers and the registry that maps extensions to them.

mod registry;
mod zip;

use std::io::Read;

pub use self::registry::FormatRegistry;
pub use self::zip::ZipFormat;
use crate::ArchiveResult;
use crate::expand::EntryKind;

/// One item inside an archive, valid for the duration of a visit callback.
pub struct ArchiveEntry<'a> {
    /// Entry name exactly as stored, possibly in a legacy encoding.
    pub raw_name: &'a [u8],
    /// Whether the entry is a directory or a file.
    pub kind: EntryKind,
    /// Decompressed content; empty for directories.
    pub reader: &'a mut dyn Read,
}

impl std::fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("raw_name", &String::from_utf8_lossy(self.raw_name))
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Returned by visit callbacks to continue or stop the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// A container format that can enumerate its entries in stored order.
pub trait ArchiveFormat: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Lowercase file extensions, without the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Calls `visitor` for every entry in archive-native order until it
    /// returns [`Visit::Stop`] or an error.
    fn visit(
        &self,
        data: &[u8],
        visitor: &mut dyn FnMut(ArchiveEntry<'_>) -> ArchiveResult<Visit>,
    ) -> ArchiveResult<()>;
}
