//! Published archive model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::published_archives;

/// An object the gateway has published, keyed by its storage path.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = published_archives)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PublishedArchive {
    /// Generated identifier.
    pub id: Uuid,
    /// Storage path, `app_id/hash/...` for ingested archives.
    pub path: String,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record was last updated.
    pub updated_at: Timestamp,
}

impl PublishedArchive {
    /// Returns when the object was first recorded.
    pub fn published_at(&self) -> jiff::Timestamp {
        self.created_at.into()
    }
}

/// Data for recording a newly published object.
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = published_archives)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPublishedArchive {
    /// Storage path.
    pub path: String,
}

impl NewPublishedArchive {
    /// Creates a record for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}
