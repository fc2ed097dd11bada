//! Materializes archives on scratch storage.
//!
//! Entries are processed in stored order. Names are repaired, platform noise
//! is dropped, and any file whose extension belongs to a registered format is
//! expanded in place of being written, into the current extraction root: the
//! first directory of its own archive when that directory is the first entry,
//! otherwise the directory the archive itself is being expanded into.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::encoding::{is_noise, repair_name};
use crate::format::{ArchiveEntry, ArchiveFormat, FormatRegistry, Visit};
use crate::{ArchiveError, ArchiveResult, TRACING_TARGET_EXPAND};

/// Kind of an archive entry or tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// One node of an [`ExpandedTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// `/`-separated path relative to the tree root.
    pub path: String,
    pub kind: EntryKind,
}

/// Bounds applied while expanding untrusted archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandLimits {
    /// Maximum nesting of archives inside archives. The submitted archive is
    /// depth zero.
    pub max_depth: usize,
    /// Maximum number of bytes decompressed across all levels.
    pub max_total_bytes: u64,
}

impl ExpandLimits {
    /// Default nesting limit.
    pub const DEFAULT_MAX_DEPTH: usize = 8;
    /// Default decompressed size limit: 1 GiB.
    pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 1024 * 1024 * 1024;

    /// Creates limits with the given values.
    pub fn new(max_depth: usize, max_total_bytes: u64) -> Self {
        Self {
            max_depth,
            max_total_bytes,
        }
    }
}

impl Default for ExpandLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH, Self::DEFAULT_MAX_TOTAL_BYTES)
    }
}

/// Result of an expansion: the files and directories written under `root`,
/// in the order they were produced.
#[derive(Debug, Clone)]
pub struct ExpandedTree {
    root: PathBuf,
    entries: Vec<TreeEntry>,
    total_bytes: u64,
}

impl ExpandedTree {
    /// Directory the tree was expanded into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All nodes in production order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// File nodes in production order.
    pub fn files(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
    }

    /// Returns `true` if the tree contains a file at `path`.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files().any(|entry| entry.path == path)
    }

    /// Location of `entry` on scratch storage.
    pub fn absolute_path(&self, entry: &TreeEntry) -> PathBuf {
        self.root.join(&entry.path)
    }

    /// Number of decompressed bytes written, nested archives included.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

/// Expands archives into scratch directories using an injected registry.
#[derive(Debug, Clone)]
pub struct Expander {
    registry: FormatRegistry,
    limits: ExpandLimits,
}

impl Expander {
    /// Creates a new expander.
    pub fn new(registry: FormatRegistry, limits: ExpandLimits) -> Self {
        Self { registry, limits }
    }

    /// Returns the registry used for nested archives.
    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Returns the configured limits.
    pub fn limits(&self) -> ExpandLimits {
        self.limits
    }

    /// Expands `data` into `dst`, creating it if needed.
    ///
    /// On error the partially written tree is left in place; the caller owns
    /// `dst` and removes it.
    pub fn expand(
        &self,
        data: &[u8],
        format: &dyn ArchiveFormat,
        dst: &Path,
    ) -> ArchiveResult<ExpandedTree> {
        create_dir(dst)?;

        let mut expansion = Expansion {
            root: dst,
            registry: &self.registry,
            limits: self.limits,
            written: 0,
            entries: Vec::new(),
            seen: HashSet::new(),
        };

        expansion.expand_level(data, format, "", 0)?;

        tracing::debug!(
            target: TRACING_TARGET_EXPAND,
            root = %dst.display(),
            format = format.name(),
            entries = expansion.entries.len(),
            bytes = expansion.written,
            "Archive expanded"
        );

        Ok(ExpandedTree {
            root: dst.to_path_buf(),
            entries: expansion.entries,
            total_bytes: expansion.written,
        })
    }
}

struct Expansion<'a> {
    root: &'a Path,
    registry: &'a FormatRegistry,
    limits: ExpandLimits,
    written: u64,
    entries: Vec<TreeEntry>,
    seen: HashSet<String>,
}

impl Expansion<'_> {
    fn expand_level(
        &mut self,
        data: &[u8],
        format: &dyn ArchiveFormat,
        base: &str,
        depth: usize,
    ) -> ArchiveResult<()> {
        let mut extraction_root: Option<String> = None;
        let mut first_entry = true;

        format.visit(data, &mut |entry| {
            let name = repair_name(entry.raw_name);
            if is_noise(&name) {
                return Ok(Visit::Continue);
            }

            let Some(relative) = sanitize(&name)? else {
                return Ok(Visit::Continue);
            };
            let path = join(base, &relative);
            let opens_window = std::mem::replace(&mut first_entry, false);

            match entry.kind {
                EntryKind::Directory => {
                    create_dir(&self.root.join(&path))?;
                    if opens_window {
                        extraction_root = Some(path.clone());
                    }
                    self.record(path, EntryKind::Directory);
                }
                EntryKind::File => match self.registry.for_file_name(&path) {
                    Some(nested) => {
                        let target = extraction_root.as_deref().unwrap_or(base).to_owned();
                        self.expand_nested(entry, nested.as_ref(), &path, &target, depth)?;
                    }
                    None => {
                        self.write_file(entry, &path)?;
                        self.record(path, EntryKind::File);
                    }
                },
            }

            Ok(Visit::Continue)
        })
    }

    fn expand_nested(
        &mut self,
        entry: ArchiveEntry<'_>,
        format: &dyn ArchiveFormat,
        path: &str,
        target: &str,
        depth: usize,
    ) -> ArchiveResult<()> {
        if depth + 1 > self.limits.max_depth {
            return Err(ArchiveError::DepthExceeded {
                limit: self.limits.max_depth,
            });
        }

        let mut data = Vec::new();
        self.limited(entry.reader).read_to_end(&mut data)?;
        self.account(data.len() as u64)?;

        // A nested archive may replace a file written earlier under the same name.
        self.forget(path);
        let stale = self.root.join(path);
        if stale.is_file() {
            fs::remove_file(&stale)?;
        }

        tracing::debug!(
            target: TRACING_TARGET_EXPAND,
            archive = %path,
            into = %target,
            depth = depth + 1,
            size = data.len(),
            "Expanding nested archive"
        );

        self.expand_level(&data, format, target, depth + 1)
    }

    fn write_file(&mut self, entry: ArchiveEntry<'_>, path: &str) -> ArchiveResult<()> {
        let destination = self.root.join(path);
        if let Some(parent) = destination.parent() {
            create_dir(parent)?;
        }

        let mut file = File::create(&destination)?;
        let copied = io::copy(&mut self.limited(entry.reader), &mut file)?;
        self.account(copied)
    }

    /// Wraps `reader` so that it yields at most one byte past the remaining
    /// budget, which is enough for [`Self::account`] to detect the overflow.
    fn limited<'r>(&self, reader: &'r mut dyn Read) -> io::Take<&'r mut dyn Read> {
        let remaining = self.limits.max_total_bytes.saturating_sub(self.written);
        reader.take(remaining.saturating_add(1))
    }

    fn account(&mut self, bytes: u64) -> ArchiveResult<()> {
        self.written = self.written.saturating_add(bytes);
        if self.written > self.limits.max_total_bytes {
            return Err(ArchiveError::SizeExceeded {
                limit: self.limits.max_total_bytes,
            });
        }
        Ok(())
    }

    fn record(&mut self, path: String, kind: EntryKind) {
        if self.seen.insert(path.clone()) {
            self.entries.push(TreeEntry { path, kind });
        }
    }

    fn forget(&mut self, path: &str) {
        if self.seen.remove(path) {
            self.entries.retain(|entry| entry.path != path);
        }
    }
}

/// Normalizes an entry name into a relative `/`-separated path.
///
/// Returns `None` for names without any component (such as `./`) and rejects
/// absolute names and names that climb out of the root.
fn sanitize(name: &str) -> ArchiveResult<Option<String>> {
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(ArchiveError::UnsafePath(name.to_owned()));
    }

    let mut components = Vec::new();
    for component in name.split('/') {
        match component {
            "" | "." => {}
            ".." => return Err(ArchiveError::UnsafePath(name.to_owned())),
            other if other.contains('\\') || other.contains(':') => {
                return Err(ArchiveError::UnsafePath(name.to_owned()));
            }
            other => components.push(other),
        }
    }

    Ok((!components.is_empty()).then(|| components.join("/")))
}

fn join(base: &str, relative: &str) -> String {
    if base.is_empty() {
        relative.to_owned()
    } else {
        format!("{base}/{relative}")
    }
}

#[cfg(unix)]
fn create_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o755).create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ZipFormat;
    use crate::testing::{dir, file, zip_bytes};

    fn expander() -> Expander {
        Expander::new(FormatRegistry::standard(), ExpandLimits::default())
    }

    fn file_paths(tree: &ExpandedTree) -> Vec<&str> {
        tree.files().map(|entry| entry.path.as_str()).collect()
    }

    #[test]
    fn writes_files_and_directories() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let data = zip_bytes(&[
            dir("site/"),
            file("site/index.html", b"<html></html>"),
            file("site/css/style.css", b"body{}"),
        ]);

        let tree = expander().expand(&data, &ZipFormat, scratch.path())?;

        assert_eq!(file_paths(&tree), ["site/index.html", "site/css/style.css"]);
        assert_eq!(
            fs::read_to_string(scratch.path().join("site/css/style.css"))?,
            "body{}"
        );
        assert_eq!(tree.total_bytes(), 19);
        Ok(())
    }

    #[test]
    fn skips_platform_noise() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let data = zip_bytes(&[
            file("index.html", b"x"),
            dir("__MACOSX/"),
            file("__MACOSX/._index.html", b"junk"),
            file(".DS_Store", b"junk"),
        ]);

        let tree = expander().expand(&data, &ZipFormat, scratch.path())?;

        assert_eq!(file_paths(&tree), ["index.html"]);
        assert!(!scratch.path().join("__MACOSX").exists());
        Ok(())
    }

    #[test]
    fn flattens_nested_archives_into_the_wrapping_directory() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let inner = zip_bytes(&[file("page.html", b"inner"), file("img/a.png", b"png")]);
        let outer = zip_bytes(&[
            dir("site/"),
            file("site/index.html", b"outer"),
            file("site/assets/bundle.zip", &inner),
        ]);

        let tree = expander().expand(&outer, &ZipFormat, scratch.path())?;

        assert_eq!(
            file_paths(&tree),
            ["site/index.html", "site/page.html", "site/img/a.png"]
        );
        assert!(!tree.contains_file("site/assets/bundle.zip"));
        assert!(!scratch.path().join("site/assets/bundle.zip").exists());
        assert_eq!(fs::read_to_string(scratch.path().join("site/page.html"))?, "inner");
        Ok(())
    }

    #[test]
    fn flat_archives_expand_nested_content_at_the_root() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let inner = zip_bytes(&[file("extra.txt", b"e")]);
        let outer = zip_bytes(&[file("index.html", b"i"), dir("docs/"), file("docs/more.zip", &inner)]);

        let tree = expander().expand(&outer, &ZipFormat, scratch.path())?;

        assert_eq!(file_paths(&tree), ["index.html", "extra.txt"]);
        Ok(())
    }

    #[test]
    fn rejects_archives_nested_too_deep() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let level2 = zip_bytes(&[file("deep.txt", b"d")]);
        let level1 = zip_bytes(&[file("level2.zip", &level2)]);
        let level0 = zip_bytes(&[file("level1.zip", &level1)]);

        let shallow = Expander::new(FormatRegistry::standard(), ExpandLimits::new(1, 1 << 20));
        let result = shallow.expand(&level0, &ZipFormat, scratch.path());
        assert!(matches!(result, Err(ArchiveError::DepthExceeded { limit: 1 })));

        let deep = Expander::new(FormatRegistry::standard(), ExpandLimits::new(2, 1 << 20));
        let tree = deep.expand(&level0, &ZipFormat, scratch.path())?;
        assert_eq!(file_paths(&tree), ["deep.txt"]);
        Ok(())
    }

    #[test]
    fn rejects_oversized_content() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let data = zip_bytes(&[file("a.bin", &[0u8; 600]), file("b.bin", &[0u8; 600])]);

        let limited = Expander::new(FormatRegistry::standard(), ExpandLimits::new(4, 1000));
        let result = limited.expand(&data, &ZipFormat, scratch.path());

        assert!(matches!(result, Err(ArchiveError::SizeExceeded { limit: 1000 })));
        Ok(())
    }

    #[test]
    fn rejects_path_traversal() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let data = zip_bytes(&[file("../escape.txt", b"x")]);

        let result = expander().expand(&data, &ZipFormat, scratch.path());

        assert!(matches!(result, Err(ArchiveError::UnsafePath(_))));
        assert!(!scratch.path().join("../escape.txt").exists());
        Ok(())
    }

    #[test]
    fn sanitizes_names() -> ArchiveResult<()> {
        assert_eq!(sanitize("./site//a.css")?, Some("site/a.css".to_owned()));
        assert_eq!(sanitize("./")?, None);
        assert!(sanitize("/etc/passwd").is_err());
        assert!(sanitize("a/../../b").is_err());
        assert!(sanitize("C:/windows").is_err());
        Ok(())
    }

    #[test]
    fn malformed_archives_fail() -> ArchiveResult<()> {
        let scratch = tempfile::tempdir()?;
        let result = expander().expand(b"PK but not really", &ZipFormat, scratch.path());
        assert!(matches!(result, Err(ArchiveError::Malformed(_))));
        Ok(())
    }
}
