use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{ArchiveFormat, ZipFormat};
use crate::locator::file_extension;

/// Immutable mapping from file extensions to archive handlers.
///
/// Built once at startup and shared by the resolver, the expander and the
/// ingestion service. Supporting a new format means registering a handler
/// here with [`FormatRegistry::with_format`].
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<&'static str, Arc<dyn ArchiveFormat>>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the registry with every handler shipped in this crate.
    pub fn standard() -> Self {
        Self::new().with_format(ZipFormat)
    }

    /// Registers `format` under each of its extensions.
    pub fn with_format(mut self, format: impl ArchiveFormat + 'static) -> Self {
        let format: Arc<dyn ArchiveFormat> = Arc::new(format);
        for extension in format.extensions() {
            self.formats.insert(*extension, Arc::clone(&format));
        }
        self
    }

    /// Looks up a handler by extension, ignoring case and a leading dot.
    pub fn for_extension(&self, extension: &str) -> Option<Arc<dyn ArchiveFormat>> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.formats.get(extension.as_str()).cloned()
    }

    /// Looks up a handler by the extension of `file_name`.
    pub fn for_file_name(&self, file_name: &str) -> Option<Arc<dyn ArchiveFormat>> {
        file_extension(file_name).and_then(|extension| self.for_extension(extension))
    }

    /// Returns `true` if `file_name` has a registered archive extension.
    pub fn is_archive(&self, file_name: &str) -> bool {
        self.for_file_name(file_name).is_some()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<_> = self.formats.keys().collect();
        extensions.sort();
        f.debug_struct("FormatRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}
