//! Liveness and readiness probes.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{any, get};
use kiosk_nats::NatsClient;
use kiosk_postgres::PgClient;

use super::response::Readiness;
use crate::extract::Json;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "kiosk_server::handler::monitors";

/// Answers as long as the process serves requests.
async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Pings the metadata store and the cache.
#[tracing::instrument(skip_all)]
async fn readiness(
    State(postgres): State<PgClient>,
    State(nats): State<NatsClient>,
) -> (StatusCode, Json<Readiness>) {
    let (pg_ping, nats_ping) = tokio::join!(postgres.ping(), nats.ping());

    if let Err(error) = &pg_ping {
        tracing::warn!(target: TRACING_TARGET, error = %error, "Postgres is not ready");
    }
    if let Err(error) = &nats_ping {
        tracing::warn!(target: TRACING_TARGET, error = %error, "NATS is not ready");
    }

    let readiness = Readiness {
        postgres: pg_ping.is_ok(),
        nats: nats_ping.is_ok(),
    };

    let status_code = if readiness.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Returns a [`Router`] with the probe routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/liveness", get(liveness))
        .route("/readiness", any(readiness))
}

#[cfg(test)]
mod tests {
    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn liveness_is_always_ok() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server.get("/liveness").await;
        response.assert_status_ok();

        Ok(())
    }

    #[tokio::test]
    async fn probes_are_not_under_the_base_path() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server
            .get("/api/v1/fileserver/liveness")
            .expect_failure()
            .await;
        response.assert_status_not_found();

        Ok(())
    }
}
