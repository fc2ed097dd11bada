#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Embeds all migrations into the final binary.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();

/// Tracing target for client-related operations.
pub const TRACING_TARGET_CLIENT: &str = "kiosk_postgres::client";

/// Tracing target for database query operations.
pub const TRACING_TARGET_QUERY: &str = "kiosk_postgres::queries";

/// Tracing target for database migration operations.
pub const TRACING_TARGET_MIGRATION: &str = "kiosk_postgres::migrations";

/// Tracing target for connection establishment and pool management.
pub const TRACING_TARGET_CONNECTION: &str = "kiosk_postgres::connection";

mod client;
pub mod model;
pub mod query;
mod schema;

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::ConnectionError;
use diesel::result::Error;
pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionPool, MigrationResult, PgClient, PgClientMigrationExt, PgConfig, PgConn,
    PgPoolStatus, PooledConnection, run_pending_migrations,
};

pub mod error {
    //! Error types and utilities for database operations.
    //!
    //! See [`PgError`] for the main error type used throughout this crate.
    //!
    //! [`PgError`]: crate::PgError

    /// Type-erased error type for dynamic error handling.
    pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

    pub use deadpool::managed::TimeoutType;
    pub use diesel::result::{ConnectionError as DieselConnectionError, Error as DieselError};
    pub use diesel_async::pooled_connection::PoolError as DieselPoolError;
    pub use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;
}

/// Error type for all PostgreSQL operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Invalid configuration parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection creation, waiting or recycling timed out.
    #[error("Database operation timed out")]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Applying the embedded migrations failed.
    #[error("Database migration error: {0}")]
    Migration(error::BoxError),

    /// Query execution failed.
    #[error("Database query error: {0}")]
    Query(#[from] Error),

    /// Anything not covered above.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Returns whether this error might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Timeout(_) | PgError::Connection(ConnectionError::BadConnection(_))
        )
    }
}

impl From<error::DeadpoolError> for PgError {
    fn from(value: error::DeadpoolError) -> Self {
        use error::{DeadpoolError, DieselPoolError};

        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(err) => {
                tracing::warn!(target: TRACING_TARGET_CONNECTION, error = %err, "Unexpected post-create hook error");
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                tracing::error!(target: TRACING_TARGET_CONNECTION, "No tokio runtime specified for connection pool");
                Self::Unexpected("No runtime specified".into())
            }
            DeadpoolError::Closed => Self::Connection(ConnectionError::InvalidConnectionUrl(
                "Connection pool is closed".into(),
            )),
        }
    }
}

/// Specialized [`Result`] type for database operations.
pub type PgResult<T, E = PgError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_transient() {
        assert!(PgError::Timeout(TimeoutType::Wait).is_transient());
        assert!(!PgError::Config("bad".into()).is_transient());
        assert!(!PgError::Query(Error::NotFound).is_transient());
    }
}
