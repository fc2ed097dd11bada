//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use kiosk_server::handler::routes;
//! use kiosk_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example(config: ServiceConfig) -> anyhow::Result<()> {
//! let state = ServiceState::from_config(&config).await?;
//! let router: axum::Router = routes(state.clone()).with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod compress;
mod error;
mod files;
mod monitors;
mod request;
mod response;
mod signatures;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub(crate) use crate::handler::response::ErrorResponse;
use crate::service::ServiceState;

/// Prefix of every gateway route.
pub const BASE_PATH: &str = "/api/v1/fileserver";

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with the gateway routes under [`BASE_PATH`] and the
/// probes at the root.
pub fn routes(state: ServiceState) -> Router<ServiceState> {
    let gateway = Router::new()
        .merge(compress::routes(state.upload_limits))
        .merge(files::routes())
        .merge(signatures::routes());

    Router::new()
        .nest(BASE_PATH, gateway)
        .merge(monitors::routes())
        .fallback(handler)
}

#[cfg(test)]
mod test {
    use axum::Router;
    use axum_test::TestServer;

    use crate::handler::routes;
    use crate::service::testing;
    use crate::service::{ServiceConfig, ServiceState};

    /// Returns a new [`TestServer`] with the given router.
    pub async fn create_test_server_with_router(
        router: impl Fn(ServiceState) -> Router<ServiceState>,
    ) -> anyhow::Result<TestServer> {
        create_test_server_with_config(router, &testing::config()).await
    }

    /// Returns a new [`TestServer`] with the given router built on `config`.
    pub async fn create_test_server_with_config(
        router: impl Fn(ServiceState) -> Router<ServiceState>,
        config: &ServiceConfig,
    ) -> anyhow::Result<TestServer> {
        let state = testing::state(config).await?;
        let router = router(state.clone());
        create_test_server_with_state(router, state).await
    }

    /// Returns a new [`TestServer`] with the given router and state.
    pub async fn create_test_server_with_state(
        router: Router<ServiceState>,
        state: ServiceState,
    ) -> anyhow::Result<TestServer> {
        let app = router.with_state(state);
        let server = TestServer::new(app)?;
        Ok(server)
    }

    /// Returns a new [`TestServer`] with the default router and state.
    pub async fn create_test_server() -> anyhow::Result<TestServer> {
        create_test_server_with_router(routes).await
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let server = create_test_server().await?;
        assert!(server.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server.get("/api/v1/fileserver/nope").expect_failure().await;
        response.assert_status_not_found();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "not_found");
        assert_eq!(body["code"], 100014000404u64);

        Ok(())
    }
}
