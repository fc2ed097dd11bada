//! Published archive repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewPublishedArchive, PublishedArchive};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Lookups and writes on `published_archives`.
///
/// There is no uniqueness constraint on `path`: callers check for an
/// existing record before creating one.
pub trait PublishedArchiveRepository {
    /// Finds the oldest record stored under `path`.
    fn find_published_archive_by_path(
        &mut self,
        path: &str,
    ) -> impl Future<Output = PgResult<Option<PublishedArchive>>> + Send;

    /// Inserts a new record.
    fn create_published_archive(
        &mut self,
        new_archive: NewPublishedArchive,
    ) -> impl Future<Output = PgResult<PublishedArchive>> + Send;

    /// Deletes a record by id. Deleting a missing record is not an error.
    fn delete_published_archive(
        &mut self,
        archive_id: Uuid,
    ) -> impl Future<Output = PgResult<()>> + Send;
}

impl PublishedArchiveRepository for PgConnection {
    async fn find_published_archive_by_path(
        &mut self,
        path: &str,
    ) -> PgResult<Option<PublishedArchive>> {
        use schema::published_archives::dsl;

        let archive = dsl::published_archives
            .filter(dsl::path.eq(path))
            .order(dsl::created_at.asc())
            .select(PublishedArchive::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(archive)
    }

    async fn create_published_archive(
        &mut self,
        new_archive: NewPublishedArchive,
    ) -> PgResult<PublishedArchive> {
        use schema::published_archives;

        let archive = diesel::insert_into(published_archives::table)
            .values(&new_archive)
            .returning(PublishedArchive::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            id = %archive.id,
            path = %archive.path,
            published_at = %archive.published_at(),
            "Published archive recorded"
        );

        Ok(archive)
    }

    async fn delete_published_archive(&mut self, archive_id: Uuid) -> PgResult<()> {
        use schema::published_archives::dsl;

        let deleted = diesel::delete(dsl::published_archives.filter(dsl::id.eq(archive_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            id = %archive_id,
            deleted,
            "Published archive record removed"
        );

        Ok(())
    }
}
