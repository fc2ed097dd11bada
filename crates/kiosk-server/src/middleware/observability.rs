//! Request IDs, trace spans and request metrics.

use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::header::{self, HeaderName};
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use super::TRACING_TARGET_METRICS;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Extension trait for `axum::`[`Router`] to apply observability middleware.
pub trait RouterObservabilityExt<S> {
    /// Assigns each request an `x-request-id`, echoes it on the response and
    /// opens a trace span per request. Credentials are redacted from logs.
    fn with_observability(self) -> Self;

    /// Logs method, status, duration and body sizes of every request.
    fn with_metrics(self) -> Self;
}

impl<S> RouterObservabilityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_observability(self) -> Self {
        self.layer(PropagateRequestIdLayer::new(REQUEST_ID))
            .layer(SetSensitiveRequestHeadersLayer::new([
                header::AUTHORIZATION,
                header::COOKIE,
            ]))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
    }

    fn with_metrics(self) -> Self {
        self.layer(from_fn(track_request_metrics))
    }
}

/// Request metrics middleware.
pub async fn track_request_metrics(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_size = content_length(request.headers());

    let response = next.run(request).await;

    tracing::debug!(
        target: TRACING_TARGET_METRICS,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = start_time.elapsed().as_millis() as u64,
        request_size,
        response_size = content_length(response.headers()),
        "request completed"
    );

    response
}

fn content_length(headers: &header::HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[tokio::test]
    async fn responses_carry_a_request_id() -> anyhow::Result<()> {
        let app: Router = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .with_metrics()
            .with_observability();
        let server = TestServer::new(app)?;

        let response = server.get("/ping").await;
        response.assert_status_ok();
        assert!(response.headers().contains_key(REQUEST_ID));

        let response = server
            .get("/ping")
            .add_header(REQUEST_ID, HeaderValue::from_static("abc-123"))
            .await;
        assert_eq!(response.header(REQUEST_ID), "abc-123");

        Ok(())
    }
}
