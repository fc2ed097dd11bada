//! Timeouts and panic recovery.

use std::any::Any;
use std::future::ready;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

use super::TRACING_TARGET_RECOVERY;
use crate::handler::{Error, ErrorKind};

type ResponseFut = BoxFuture<'static, Response>;
type Panic = Box<dyn Any + Send + 'static>;

/// Default request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Configuration of the recovery middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Seconds a request may take before it is answered with a 500
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT)
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::with_timeout_secs(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl RecoveryConfig {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            request_timeout: secs,
        }
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Extension trait for `axum::`[`Router`] to apply recovery middleware.
pub trait RouterRecoveryExt<S> {
    /// Answers timed-out requests, panicking handlers and middleware errors
    /// with a JSON [`Error`].
    fn with_recovery(self, config: &RecoveryConfig) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        let middlewares = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .layer(CatchPanicLayer::custom(catch_panic))
            .layer(TimeoutLayer::new(config.request_timeout()));

        self.layer(middlewares)
    }
}

fn handle_error(err: tower::BoxError) -> ResponseFut {
    use tower::timeout::error::Elapsed;

    let error = if err.is::<Elapsed>() {
        tracing::warn!(target: TRACING_TARGET_RECOVERY, "Request timeout exceeded");

        ErrorKind::InternalServerError
            .with_message("Request timeout")
            .with_context("The request took too long to process and was terminated")
    } else {
        tracing::error!(
            target: TRACING_TARGET_RECOVERY,
            error = %err,
            "Unhandled middleware error"
        );

        ErrorKind::InternalServerError.with_context(err.to_string())
    };

    ready(error.into_response()).boxed()
}

fn catch_panic(err: Panic) -> Response {
    if let Some(error) = err.downcast_ref::<Error>() {
        tracing::error!(target: TRACING_TARGET_RECOVERY, error = %error, "Handler panicked");
        return error.clone().into_response();
    }

    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic type");

    tracing::error!(target: TRACING_TARGET_RECOVERY, message = %message, "Handler panicked");

    ErrorKind::InternalServerError
        .with_message("An unexpected panic occurred")
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "done"
    }

    async fn panics() -> &'static str {
        panic!("handler bug")
    }

    #[tokio::test]
    async fn panics_become_internal_errors() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/panic", get(panics))
            .with_recovery(&RecoveryConfig::default());
        let server = TestServer::new(app)?;

        let response = server.get("/panic").expect_failure().await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "internal_server_error");

        Ok(())
    }

    #[tokio::test]
    async fn slow_requests_time_out() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/slow", get(slow))
            .with_recovery(&RecoveryConfig::with_timeout_secs(0));
        let server = TestServer::new(app)?;

        let response = server.get("/slow").expect_failure().await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.text().contains("Request timeout"));

        Ok(())
    }
}
