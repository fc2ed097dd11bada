//! Entry-document resolution.

use crate::encoding::{is_noise, repair_name};
use crate::expand::EntryKind;
use crate::format::{ArchiveFormat, Visit};
use crate::{ArchiveError, ArchiveResult, TRACING_TARGET_RESOLVE};

/// Names accepted as a site's entry document, in priority order.
pub const INDEX_NAMES: [&str; 2] = ["index.html", "index.htm"];

/// Finds the entry document of an archive without touching scratch storage.
///
/// Candidates start as the root-level [`INDEX_NAMES`]. When the first
/// non-noise entry is a directory, the same names inside that directory are
/// added too, which covers archives wrapped in a single top-level folder.
/// The first file entry, in stored order, whose repaired name equals a
/// candidate wins.
///
/// # Errors
///
/// Returns [`ArchiveError::MissingIndex`] when no file matches and
/// [`ArchiveError::Malformed`] when the container cannot be read.
pub fn resolve_index(format: &dyn ArchiveFormat, data: &[u8]) -> ArchiveResult<String> {
    let mut candidates: Vec<String> = INDEX_NAMES.iter().map(|name| (*name).to_owned()).collect();
    let mut first_entry = true;
    let mut found = None;

    format.visit(data, &mut |entry| {
        let name = repair_name(entry.raw_name);
        if is_noise(&name) {
            return Ok(Visit::Continue);
        }

        let opens_window = std::mem::replace(&mut first_entry, false);

        match entry.kind {
            EntryKind::Directory => {
                if opens_window {
                    let prefix = if name.ends_with('/') {
                        name
                    } else {
                        format!("{name}/")
                    };
                    candidates.extend(INDEX_NAMES.iter().map(|index| format!("{prefix}{index}")));
                }
                Ok(Visit::Continue)
            }
            EntryKind::File if candidates.contains(&name) => {
                found = Some(name);
                Ok(Visit::Stop)
            }
            EntryKind::File => Ok(Visit::Continue),
        }
    })?;

    match found {
        Some(path) => {
            tracing::debug!(target: TRACING_TARGET_RESOLVE, index = %path, "Entry document resolved");
            Ok(path)
        }
        None => {
            tracing::debug!(target: TRACING_TARGET_RESOLVE, candidates = ?candidates, "No entry document");
            Err(ArchiveError::MissingIndex)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ZipFormat;
    use crate::testing::{dir, file, zip_bytes};

    #[test]
    fn root_index_wins_without_inspecting_directories() -> ArchiveResult<()> {
        let data = zip_bytes(&[
            file("index.html", b"root"),
            dir("site/"),
            file("site/index.html", b"nested"),
        ]);

        assert_eq!(resolve_index(&ZipFormat, &data)?, "index.html");
        Ok(())
    }

    #[test]
    fn wrapping_directory_is_searched() -> ArchiveResult<()> {
        let data = zip_bytes(&[
            dir("site/"),
            file("site/about.html", b"about"),
            file("site/index.htm", b"index"),
        ]);

        assert_eq!(resolve_index(&ZipFormat, &data)?, "site/index.htm");
        Ok(())
    }

    #[test]
    fn stored_order_breaks_ties() -> ArchiveResult<()> {
        let data = zip_bytes(&[
            dir("site/"),
            file("site/index.htm", b"first"),
            file("index.html", b"second"),
        ]);

        assert_eq!(resolve_index(&ZipFormat, &data)?, "site/index.htm");
        Ok(())
    }

    #[test]
    fn only_the_first_directory_seeds_candidates() {
        let data = zip_bytes(&[
            dir("a/"),
            dir("b/"),
            file("b/index.html", b"b"),
        ]);

        assert!(matches!(
            resolve_index(&ZipFormat, &data),
            Err(ArchiveError::MissingIndex)
        ));
    }

    #[test]
    fn noise_does_not_claim_the_first_slot() -> ArchiveResult<()> {
        let data = zip_bytes(&[
            dir("__MACOSX/"),
            dir("site/"),
            file("site/index.html", b"x"),
        ]);

        assert_eq!(resolve_index(&ZipFormat, &data)?, "site/index.html");
        Ok(())
    }

    #[test]
    fn missing_index_is_reported() {
        let empty = zip_bytes(&[]);
        assert!(matches!(
            resolve_index(&ZipFormat, &empty),
            Err(ArchiveError::MissingIndex)
        ));

        let no_match = zip_bytes(&[file("readme.txt", b"r"), file("deep/x/index.html", b"i")]);
        assert!(matches!(
            resolve_index(&ZipFormat, &no_match),
            Err(ArchiveError::MissingIndex)
        ));
    }

    #[test]
    fn malformed_container_is_not_missing_index() {
        assert!(matches!(
            resolve_index(&ZipFormat, b"nope"),
            Err(ArchiveError::Malformed(_))
        ));
    }
}
