//! Applies the embedded migrations.

use std::time::{Duration, Instant};

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Versions applied by this run, oldest first.
    pub applied_versions: Vec<String>,
    /// Wall-clock time spent.
    pub duration: Duration,
}

impl MigrationResult {
    /// Returns `true` if the schema was already current.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.applied_versions.is_empty()
    }
}

/// Migration methods on [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies every pending migration. Safe to call repeatedly.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>> + Send;
}

impl PgClientMigrationExt for PgClient {
    async fn run_pending_migrations(&self) -> PgResult<MigrationResult> {
        run_pending_migrations(self).await
    }
}

/// Applies every pending migration on a pooled connection.
///
/// The diesel harness is synchronous, so it runs on a blocking thread.
#[tracing::instrument(skip(pg), target = TRACING_TARGET_MIGRATION)]
pub async fn run_pending_migrations(pg: &PgClient) -> PgResult<MigrationResult> {
    let start = Instant::now();
    let conn = pg.get_pooled_connection().await?;
    let mut conn: AsyncConnectionWrapper<_> = conn.into();

    let versions = spawn_blocking(move || {
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.into_iter().map(|v| v.to_string()).collect::<Vec<_>>())
    })
    .await
    .map_err(|err| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %err, "Migration task panicked");
        PgError::Migration(err.into())
    })?
    .map_err(|err| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %err, "Database migration failed");
        PgError::Migration(err)
    })?;

    let result = MigrationResult {
        applied_versions: versions,
        duration: start.elapsed(),
    };

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        applied = result.applied_versions.len(),
        duration = ?result.duration,
        "Database schema is up to date"
    );

    Ok(result)
}
