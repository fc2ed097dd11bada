//! Diesel models for the gateway's tables.

mod published_archive;

pub use published_archive::{NewPublishedArchive, PublishedArchive};
