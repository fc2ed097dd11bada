use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadpool::managed::{Hook, Pool};
use derive_more::{Deref, DerefMut};
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};

use super::custom_hooks;
use crate::{
    ConnectionPool, PgConfig, PgError, PgResult, PooledConnection, TRACING_TARGET_CLIENT,
    TRACING_TARGET_CONNECTION,
};

/// Connection pool status information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgPoolStatus {
    /// Maximum number of connections in the pool
    pub max_size: usize,
    /// Current number of connections in the pool
    pub size: usize,
    /// Number of idle connections
    pub available: usize,
    /// Number of requests waiting for a connection
    pub waiting: usize,
}

impl PgPoolStatus {
    /// Returns the utilization of the pool, from 0.0 to 1.0.
    #[inline]
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.size.saturating_sub(self.available) as f64 / self.max_size as f64
        }
    }

    /// Returns whether requests are waiting or the pool is nearly exhausted.
    #[inline]
    pub fn is_under_pressure(&self) -> bool {
        self.waiting > 0 || self.utilization() > 0.8
    }
}

/// Database client owning the connection pool.
///
/// Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: ConnectionPool,
    config: PgConfig,
}

impl PgClient {
    /// Creates the connection pool. No connection is opened yet.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CLIENT,
        fields(database_url = %config.database_url_masked())
    )]
    pub fn new(config: PgConfig) -> PgResult<Self> {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = Box::new(custom_hooks::setup_callback);
        let manager =
            AsyncDieselConnectionManager::new_with_config(&config.postgres_url, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .post_create(Hook::sync_fn(custom_hooks::post_create))
            .pre_recycle(Hook::sync_fn(custom_hooks::pre_recycle))
            .build()
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET_CLIENT, error = %e, "Failed to create connection pool");
                PgError::Unexpected(format!("Failed to build connection pool: {e}").into())
            })?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            max_connections = config.postgres_max_connections,
            "Database client initialized"
        );

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Creates the connection pool and verifies that the database answers.
    pub async fn new_with_test(config: PgConfig) -> PgResult<Self> {
        let this = Self::new(config)?;
        this.ping().await?;
        Ok(this)
    }

    /// Runs `SELECT 1` on a pooled connection.
    pub async fn ping(&self) -> PgResult<()> {
        #[derive(diesel::QueryableByName)]
        struct Ping {
            #[diesel(sql_type = diesel::sql_types::Integer)]
            #[allow(dead_code)]
            result: i32,
        }

        let mut conn = self.get_pooled_connection().await?;
        let _: Ping = diesel::sql_query("SELECT 1 AS result")
            .get_result(&mut *conn)
            .await
            .map_err(|e| {
                tracing::warn!(target: TRACING_TARGET_CONNECTION, error = %e, "Database ping failed");
                PgError::from(e)
            })?;

        Ok(())
    }

    /// Checks a connection out of the pool, waiting up to the configured timeout.
    pub async fn get_connection(&self) -> PgResult<PgConn> {
        let start = Instant::now();
        let conn = self.get_pooled_connection().await.inspect_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                error = %e,
                elapsed = ?start.elapsed(),
                "Failed to acquire connection from pool"
            );
        })?;

        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(100) {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                elapsed = ?elapsed,
                "Connection acquisition took longer than expected"
            );
        }

        Ok(PgConn::new(conn))
    }

    pub(crate) async fn get_pooled_connection(&self) -> PgResult<PooledConnection> {
        self.inner.pool.get().await.map_err(PgError::from)
    }

    /// Returns the current pool statistics.
    #[inline]
    pub fn pool_status(&self) -> PgPoolStatus {
        let status = self.inner.pool.status();
        PgPoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Returns the configuration the pool was built from.
    #[inline]
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.pool_status();
        f.debug_struct("PgClient")
            .field("database_url", &self.inner.config.database_url_masked())
            .field("pool_max_size", &status.max_size)
            .field("pool_size", &status.size)
            .field("pool_available", &status.available)
            .field("pool_waiting", &status.waiting)
            .finish()
    }
}

/// A pooled connection; returned to the pool on drop.
///
/// Repository traits in [`query`] are implemented for the underlying
/// [`PgConnection`] and reached through [`Deref`]:
///
/// ```ignore
/// let mut conn = pg_client.get_connection().await?;
/// let record = conn.find_published_archive_by_path("app/h/index.zip").await?;
/// ```
///
/// [`query`]: crate::query
/// [`PgConnection`]: crate::PgConnection
#[derive(Deref, DerefMut)]
pub struct PgConn {
    #[deref]
    #[deref_mut]
    conn: PooledConnection,
}

impl PgConn {
    /// Wraps a pooled connection.
    pub fn new(conn: PooledConnection) -> Self {
        Self { conn }
    }
}

impl fmt::Debug for PgConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_utilization() {
        let idle = PgPoolStatus {
            max_size: 10,
            size: 4,
            available: 4,
            waiting: 0,
        };
        assert_eq!(idle.utilization(), 0.0);
        assert!(!idle.is_under_pressure());

        let busy = PgPoolStatus {
            max_size: 10,
            size: 10,
            available: 1,
            waiting: 0,
        };
        assert!(busy.is_under_pressure());

        let queued = PgPoolStatus { waiting: 2, ..idle };
        assert!(queued.is_under_pressure());
    }
}
