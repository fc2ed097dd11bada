//! Pooled PostgreSQL client and migration runner.

pub(crate) mod custom_hooks;
mod migrate;
mod pg_client;
mod pg_config;

use deadpool::managed::{Object, Pool};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
pub use migrate::{MigrationResult, PgClientMigrationExt, run_pending_migrations};
pub use pg_client::{PgClient, PgConn, PgPoolStatus};
pub use pg_config::PgConfig;

/// Connection pool used throughout the application.
pub type ConnectionPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Connection object checked out of the pool.
pub type PooledConnection = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;
