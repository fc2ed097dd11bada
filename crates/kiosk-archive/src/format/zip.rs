use std::io::Cursor;

use zip::ZipArchive;

use super::{ArchiveEntry, ArchiveFormat, Visit};
use crate::expand::EntryKind;
use crate::{ArchiveError, ArchiveResult};

/// Zip archives, read fully from memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipFormat;

impl ArchiveFormat for ZipFormat {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["zip"]
    }

    fn visit(
        &self,
        data: &[u8],
        visitor: &mut dyn FnMut(ArchiveEntry<'_>) -> ArchiveResult<Visit>,
    ) -> ArchiveResult<()> {
        let mut archive = ZipArchive::new(Cursor::new(data)).map_err(ArchiveError::malformed)?;

        for index in 0..archive.len() {
            let mut file = archive.by_index(index).map_err(ArchiveError::malformed)?;
            // Raw bytes; the crate would otherwise decode non-UTF-8 names as CP437.
            let raw_name = file.name_raw().to_vec();
            let kind = if file.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            let entry = ArchiveEntry {
                raw_name: &raw_name,
                kind,
                reader: &mut file,
            };

            if visitor(entry)? == Visit::Stop {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::testing::{dir, file, zip_bytes};

    #[test]
    fn visits_in_stored_order() -> ArchiveResult<()> {
        let data = zip_bytes(&[dir("b/"), file("b/z.txt", b"z"), file("a.txt", b"a")]);

        let mut seen = Vec::new();
        ZipFormat.visit(&data, &mut |mut entry| {
            let mut body = String::new();
            entry.reader.read_to_string(&mut body)?;
            seen.push((String::from_utf8_lossy(entry.raw_name).into_owned(), entry.kind, body));
            Ok(Visit::Continue)
        })?;

        assert_eq!(
            seen,
            vec![
                ("b/".to_owned(), EntryKind::Directory, String::new()),
                ("b/z.txt".to_owned(), EntryKind::File, "z".to_owned()),
                ("a.txt".to_owned(), EntryKind::File, "a".to_owned()),
            ]
        );
        Ok(())
    }

    #[test]
    fn stop_ends_the_visit() -> ArchiveResult<()> {
        let data = zip_bytes(&[file("one.txt", b"1"), file("two.txt", b"2")]);

        let mut count = 0;
        ZipFormat.visit(&data, &mut |_| {
            count += 1;
            Ok(Visit::Stop)
        })?;

        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn garbage_is_malformed() {
        let result = ZipFormat.visit(b"definitely not a zip", &mut |_| Ok(Visit::Continue));
        assert!(matches!(result, Err(ArchiveError::Malformed(_))));
    }
}
