//! Object deletion, thumbnails and bucket discovery.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use kiosk_opendal::StorageClient;
use kiosk_postgres::PgClient;

use super::request::{DeleteFile, MakeThumbnail};
use super::response::{Domain, Empty};
use crate::extract::Json;
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;
use crate::service::ingest::ArchiveLedger;
use crate::service::thumbnail::{scale, thumbnail_path};

/// Tracing target for file routes.
const TRACING_TARGET: &str = "kiosk_server::handler::files";

/// Deletes an object and its record.
///
/// Paths without a record are treated as already deleted. When the object
/// cannot be removed the record is restored.
#[tracing::instrument(skip_all)]
async fn delete_file(
    State(storage): State<StorageClient>,
    State(postgres): State<PgClient>,
    Json(request): Json<DeleteFile>,
) -> Result<Json<Empty>> {
    let (backend, key) = storage.resolve(&request.path)?;

    let Some(record_id) = postgres.find(key).await? else {
        tracing::debug!(target: TRACING_TARGET, path = %request.path, "No record to delete");
        return Ok(Json(Empty::default()));
    };

    postgres.delete(record_id).await?;

    if let Err(error) = backend.delete(key).await {
        tracing::error!(
            target: TRACING_TARGET,
            path = %request.path,
            error = %error,
            "Failed to delete object, restoring its record"
        );

        if let Err(error) = postgres.create(key).await {
            tracing::error!(
                target: TRACING_TARGET,
                path = %request.path,
                error = %error,
                "Failed to restore record"
            );
        }

        return Err(ErrorKind::InvalidDelFile.with_resource(request.path));
    }

    tracing::info!(target: TRACING_TARGET, path = %request.path, "File deleted");
    Ok(Json(Empty::default()))
}

/// Writes a scaled copy of a recorded image next to it.
#[tracing::instrument(skip_all)]
async fn make_thumbnail(
    State(storage): State<StorageClient>,
    State(postgres): State<PgClient>,
    Json(request): Json<MakeThumbnail>,
) -> Result<Json<Empty>> {
    let (backend, key) = storage.resolve(&request.path)?;

    if postgres.find(key).await?.is_none() {
        return Err(ErrorKind::InvalidExist.with_resource(request.path));
    }

    let (width, height) = (request.width, request.height);
    let target = thumbnail_path(key, width, height);
    if postgres.find(&target).await?.is_some() {
        return Ok(Json(Empty::default()));
    }

    let source = backend.read(key).await.map_err(|error| {
        tracing::warn!(target: TRACING_TARGET, key = %key, error = %error, "Failed to read image");
        ErrorKind::InvalidExist.with_resource(request.path.clone())
    })?;

    let scaled = tokio::task::spawn_blocking(move || scale(&source, width, height))
        .await
        .map_err(|error| ErrorKind::Thumbnail.with_context(error.to_string()))?
        .map_err(|error| {
            tracing::warn!(target: TRACING_TARGET, key = %key, error = %error, "Failed to scale image");
            ErrorKind::Thumbnail.with_context(error.to_string())
        })?;

    let content_type = mime_guess::from_path(&target).first_or_octet_stream();
    backend
        .write(&target, scaled, Some(content_type.essence_str()))
        .await
        .map_err(|error| {
            tracing::error!(target: TRACING_TARGET, key = %target, error = %error, "Failed to store thumbnail");
            ErrorKind::Thumbnail.with_resource(target.clone())
        })?;

    postgres.create(&target).await?;

    tracing::info!(
        target: TRACING_TARGET,
        key = %target,
        width,
        height,
        "Thumbnail created"
    );

    Ok(Json(Empty::default()))
}

/// Returns the object store host and bucket names.
#[tracing::instrument(skip_all)]
async fn domain(State(storage): State<StorageClient>) -> Json<Domain> {
    let buckets = storage.buckets();

    Json(Domain {
        domain: storage.domain().to_owned(),
        private: buckets.private.clone(),
        readable: buckets.readable.clone(),
    })
}

/// Returns a [`Router`] with the file routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/del", post(delete_file))
        .route("/thumbnail", post(make_thumbnail))
        .route("/domain", post(domain))
}
