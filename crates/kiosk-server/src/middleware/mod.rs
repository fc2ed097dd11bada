//! Middleware for `axum::Router`.
//!
//! ```rust,no_run
//! use axum::Router;
//! use kiosk_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
//!
//! let app: Router = Router::new()
//!     .with_metrics()
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod observability;
mod recovery;

pub use observability::{RouterObservabilityExt, track_request_metrics};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};

/// Tracing target for request metrics.
pub const TRACING_TARGET_METRICS: &str = "kiosk_server::middleware::metrics";

/// Tracing target for error recovery.
pub const TRACING_TARGET_RECOVERY: &str = "kiosk_server::middleware::recovery";
