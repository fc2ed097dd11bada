//! Error types for NATS operations.

use std::time::Duration;

/// Result type for all NATS operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for NATS operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client or connection failure.
    #[error("NATS connection error: {0}")]
    Connection(#[from] async_nats::Error),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation did not finish in time.
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Any other failed operation, with context.
    #[error("NATS operation failed: {operation} - {details}")]
    Operation { operation: String, details: String },
}

impl Error {
    /// Creates an operation error with context.
    pub fn operation(operation: impl Into<String>, details: impl ToString) -> Self {
        Self::Operation {
            operation: operation.into(),
            details: details.to_string(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns whether retrying could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }
}
