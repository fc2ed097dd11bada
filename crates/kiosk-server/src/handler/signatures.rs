//! Presigned URLs and multipart uploads.
//!
//! Clients talk to the object store directly with the URLs returned here;
//! the gateway only signs, tracks started multipart uploads, and records
//! finished objects.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use kiosk_nats::kv::MultipartUpload;
use kiosk_opendal::StorageClient;
use kiosk_postgres::PgClient;

use super::request::{
    FinishUpload, InitMultipart, MultipartTarget, SignDownload, SignUpload, SignUploadPart,
};
use super::response::{Empty, MultipartParts, MultipartStarted, SignedUrl};
use crate::extract::Json;
use crate::handler::{ErrorKind, Result};
use crate::service::ingest::ArchiveLedger;
use crate::service::{ServiceState, UploadCache};

/// Tracing target for signing routes.
const TRACING_TARGET: &str = "kiosk_server::handler::signatures";

/// Returns a `Content-Disposition` value that saves the object as `file_name`.
///
/// Both the plain and the RFC 5987 parameter carry the percent-encoded name,
/// keeping `/` and `=` readable and encoding spaces as `%20`.
fn attachment_disposition(file_name: &str) -> String {
    let escaped = url::form_urlencoded::byte_serialize(file_name.as_bytes())
        .collect::<String>()
        .replace("%2F", "/")
        .replace("%3D", "=")
        .replace('+', "%20");

    format!("attachment; filename=\"{escaped}\"; filename*=utf-8''{escaped}")
}

/// Signs a single-request upload.
#[tracing::instrument(skip_all)]
async fn sign_upload(
    State(storage): State<StorageClient>,
    Json(request): Json<SignUpload>,
) -> Result<Json<SignedUrl>> {
    let (backend, key) = storage.resolve(&request.path)?;

    let url = backend
        .presign_write(key, storage.url_expire())
        .await
        .map_err(|error| {
            tracing::error!(target: TRACING_TARGET, path = %request.path, error = %error, "Failed to sign upload");
            ErrorKind::Signer.with_context(error.to_string())
        })?;

    Ok(Json(SignedUrl { url }))
}

/// Signs a download of a recorded object.
#[tracing::instrument(skip_all)]
async fn sign_download(
    State(storage): State<StorageClient>,
    State(postgres): State<PgClient>,
    Json(request): Json<SignDownload>,
) -> Result<Json<SignedUrl>> {
    let (backend, key) = storage.resolve(&request.path)?;

    if postgres.find(key).await?.is_none() {
        return Err(ErrorKind::InvalidExist.with_resource(request.path));
    }

    let disposition = request
        .file_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(attachment_disposition);

    let url = backend
        .presign_read(key, storage.url_expire(), disposition.as_deref())
        .await
        .map_err(|error| {
            tracing::error!(target: TRACING_TARGET, path = %request.path, error = %error, "Failed to sign download");
            ErrorKind::Signer.with_context(error.to_string())
        })?;

    Ok(Json(SignedUrl { url }))
}

/// Starts a multipart upload, or returns the one already started for the path.
#[tracing::instrument(skip_all)]
async fn init_multipart(
    State(storage): State<StorageClient>,
    State(uploads): State<UploadCache>,
    Json(request): Json<InitMultipart>,
) -> Result<Json<MultipartStarted>> {
    let (backend, key) = storage.resolve(&request.path)?;

    if let Some(upload) = uploads.get(&request.path).await? {
        tracing::debug!(target: TRACING_TARGET, path = %request.path, "Resuming multipart upload");
        return Ok(Json(MultipartStarted {
            upload_id: upload.upload_id,
        }));
    }

    let upload_id = async {
        storage
            .multipart()?
            .create(backend.bucket(), key, &request.content_type)
            .await
    }
    .await
    .map_err(|error| {
        tracing::error!(target: TRACING_TARGET, path = %request.path, error = %error, "Failed to start multipart upload");
        ErrorKind::Signer.with_context(error.to_string())
    })?;

    uploads
        .put(&MultipartUpload::new(
            &upload_id,
            &request.path,
            &request.content_type,
        ))
        .await?;

    tracing::info!(target: TRACING_TARGET, path = %request.path, "Multipart upload started");
    Ok(Json(MultipartStarted { upload_id }))
}

/// Signs the upload of one part.
#[tracing::instrument(skip_all)]
async fn sign_upload_part(
    State(storage): State<StorageClient>,
    Json(request): Json<SignUploadPart>,
) -> Result<Json<SignedUrl>> {
    let (backend, key) = storage.resolve(&request.path)?;

    let multipart = storage
        .multipart()
        .map_err(|error| ErrorKind::Signer.with_context(error.to_string()))?;
    let url = multipart
        .upload_part_url(
            backend.bucket(),
            key,
            &request.upload_id,
            request.part_number,
        )
        .await
        .map_err(|error| {
            tracing::error!(target: TRACING_TARGET, error = %error, "Failed to sign part upload");
            ErrorKind::Signer.with_context(error.to_string())
        })?;

    Ok(Json(SignedUrl { url }))
}

/// Lists the part numbers the object store holds.
#[tracing::instrument(skip_all)]
async fn list_multipart(
    State(storage): State<StorageClient>,
    Json(request): Json<MultipartTarget>,
) -> Result<Json<MultipartParts>> {
    let (backend, key) = storage.resolve(&request.path)?;

    let parts = async {
        storage
            .multipart()?
            .list_parts(backend.bucket(), key, &request.upload_id)
            .await
    }
    .await
    .map_err(|error| {
        tracing::error!(target: TRACING_TARGET, path = %request.path, error = %error, "Failed to list parts");
        ErrorKind::ListMultipart.with_context(error.to_string())
    })?;

    Ok(Json(MultipartParts {
        parts: parts.into_iter().map(|part| part.number).collect(),
    }))
}

/// Completes an upload and forgets it.
#[tracing::instrument(skip_all)]
async fn complete_multipart(
    State(storage): State<StorageClient>,
    State(uploads): State<UploadCache>,
    Json(request): Json<MultipartTarget>,
) -> Result<Json<Empty>> {
    let (backend, key) = storage.resolve(&request.path)?;

    async {
        storage
            .multipart()?
            .complete(backend.bucket(), key, &request.upload_id)
            .await
    }
    .await
    .map_err(|error| {
        tracing::error!(target: TRACING_TARGET, path = %request.path, error = %error, "Failed to complete multipart upload");
        ErrorKind::CompleteMultipart.with_context(error.to_string())
    })?;

    uploads.remove(&request.path).await?;

    tracing::info!(target: TRACING_TARGET, path = %request.path, "Multipart upload completed");
    Ok(Json(Empty::default()))
}

/// Forgets an upload and aborts it.
#[tracing::instrument(skip_all)]
async fn abort_multipart(
    State(storage): State<StorageClient>,
    State(uploads): State<UploadCache>,
    Json(request): Json<MultipartTarget>,
) -> Result<Json<Empty>> {
    let (backend, key) = storage.resolve(&request.path)?;

    uploads.remove(&request.path).await?;

    async {
        storage
            .multipart()?
            .abort(backend.bucket(), key, &request.upload_id)
            .await
    }
    .await
    .map_err(|error| {
        tracing::error!(target: TRACING_TARGET, path = %request.path, error = %error, "Failed to abort multipart upload");
        ErrorKind::InvalidDelFile.with_context(error.to_string())
    })?;

    tracing::info!(target: TRACING_TARGET, path = %request.path, "Multipart upload aborted");
    Ok(Json(Empty::default()))
}

/// Records an object uploaded through a presigned URL.
#[tracing::instrument(skip_all)]
async fn finish(
    State(storage): State<StorageClient>,
    State(postgres): State<PgClient>,
    Json(request): Json<FinishUpload>,
) -> Result<Json<Empty>> {
    let (_, key) = storage.resolve(&request.path)?;

    if postgres.find(key).await?.is_none() {
        postgres.create(key).await?;
        tracing::info!(target: TRACING_TARGET, path = %request.path, "Upload recorded");
    }

    Ok(Json(Empty::default()))
}

/// Returns a [`Router`] with the signing routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/sign/upload", post(sign_upload))
        .route("/sign/download", post(sign_download))
        .route("/sign/initMultipart", post(init_multipart))
        .route("/sign/uploadMultipart", post(sign_upload_part))
        .route("/sign/listMultipart", post(list_multipart))
        .route("/sign/completeMultipart", post(complete_multipart))
        .route("/sign/abortMultipart", post(abort_multipart))
        .route("/sign/finish", post(finish))
}
