//! Repositories implemented for [`PgConnection`].
//!
//! [`PgConnection`]: crate::PgConnection

mod published_archive;

pub use published_archive::PublishedArchiveRepository;
