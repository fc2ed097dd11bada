//! Builders for in-memory zip archives used across the crate's tests.

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub(crate) enum Item {
    Dir(String),
    File(String, Vec<u8>),
}

pub(crate) fn dir(name: &str) -> Item {
    Item::Dir(name.to_owned())
}

pub(crate) fn file(name: &str, body: &[u8]) -> Item {
    Item::File(name.to_owned(), body.to_vec())
}

pub(crate) fn zip_bytes(items: &[Item]) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for item in items {
        match item {
            Item::Dir(name) => writer.add_directory(name.as_str(), options).unwrap(),
            Item::File(name, body) => {
                writer.start_file(name.as_str(), options).unwrap();
                writer.write_all(body).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}
