//! Archive upload and published file serving.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use kiosk_archive::BlobLocator;
use kiosk_opendal::{StorageClient, StorageError};
use kiosk_postgres::PgClient;

use super::response::PublishedUrl;
use crate::extract::{Json, Multipart, Path};
use crate::handler::{ErrorKind, Result};
use crate::service::{IngestRequest, IngestService, ServiceState, UploadLimits};

/// Tracing target for archive routes.
const TRACING_TARGET: &str = "kiosk_server::handler::compress";

/// Published files never change under their content hash.
const BLOB_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Multipart field holding the archive.
const FILE_FIELD: &str = "file";
/// Multipart field holding the application id.
const APP_ID_FIELD: &str = "appID";

/// Fields of a compress upload.
#[derive(Debug, Default)]
struct CompressForm {
    app_id: Option<String>,
    file: Option<(String, Bytes)>,
}

impl CompressForm {
    async fn read(mut multipart: Multipart, limits: UploadLimits) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some(FILE_FIELD) => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let data = field.bytes().await?;
                    if limits.exceeds(data.len()) {
                        return Err(ErrorKind::FileLimit.with_resource(file_name));
                    }
                    form.file = Some((file_name, data));
                }
                Some(APP_ID_FIELD) => form.app_id = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Expands an uploaded archive and publishes its files.
#[tracing::instrument(skip_all)]
async fn compress(
    State(ingest): State<IngestService>,
    State(storage): State<StorageClient>,
    State(postgres): State<PgClient>,
    State(limits): State<UploadLimits>,
    multipart: Multipart,
) -> Result<Json<PublishedUrl>> {
    let form = CompressForm::read(multipart, limits).await?;

    let Some((file_name, data)) = form.file else {
        return Err(ErrorKind::BadRequest
            .with_message("Missing archive")
            .with_context("The 'file' field is required"));
    };
    let app_id = match form.app_id {
        Some(app_id) if !app_id.is_empty() => app_id,
        _ => {
            return Err(ErrorKind::BadRequest
                .with_message("Missing application id")
                .with_context("The 'appID' field is required"));
        }
    };

    tracing::debug!(
        target: TRACING_TARGET,
        app_id = %app_id,
        file_name = %file_name,
        bytes = data.len(),
        "Archive received"
    );

    let ingested = ingest
        .ingest(
            storage.private(),
            &postgres,
            IngestRequest {
                app_id,
                file_name,
                data,
            },
        )
        .await?;

    Ok(Json(PublishedUrl { url: ingested.url }))
}

/// Serves one published file from the private bucket.
#[tracing::instrument(skip_all)]
async fn blob(
    State(storage): State<StorageClient>,
    Path((app_id, hash, file_name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse> {
    let key = BlobLocator::new(&app_id, &hash, &file_name).storage_key();

    let data = storage.private().read(&key).await.map_err(|error| {
        if let StorageError::NotFound(_) = error {
            ErrorKind::InvalidExist.with_resource(key.clone())
        } else {
            tracing::error!(target: TRACING_TARGET, key = %key, error = %error, "Failed to read blob");
            ErrorKind::Download.with_resource(key.clone())
        }
    })?;

    let content_type = mime_guess::from_path(&file_name)
        .first_or_octet_stream()
        .to_string();

    let headers = [
        (CONTENT_TYPE, content_type),
        (CONTENT_LENGTH, data.len().to_string()),
        (CACHE_CONTROL, BLOB_CACHE_CONTROL.to_owned()),
    ];

    Ok((headers, data))
}

/// Returns a [`Router`] with the archive routes.
///
/// The compress body limit sits just above `limits.max_size` so oversized
/// archives are reported as [`ErrorKind::FileLimit`].
pub fn routes(limits: UploadLimits) -> Router<ServiceState> {
    Router::new()
        .route(
            "/compress",
            post(compress).layer(DefaultBodyLimit::max(limits.body_limit())),
        )
        .route(
            "/blob/{app_id}/{hash}/{*file_name}",
            get(blob).post(blob),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};

    use crate::handler::routes;
    use crate::handler::test::{create_test_server, create_test_server_with_config};
    use crate::service::ingest::testing::zip_bytes;
    use crate::service::testing;

    fn upload(file_name: &str, data: Vec<u8>) -> MultipartForm {
        MultipartForm::new()
            .add_text("appID", "app")
            .add_part("file", Part::bytes(data).file_name(file_name))
    }

    #[tokio::test]
    async fn unsupported_archives_are_rejected() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server
            .post("/api/v1/fileserver/compress")
            .multipart(upload("site.rar", b"Rar!".to_vec()))
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "invalid_compress");

        Ok(())
    }

    #[tokio::test]
    async fn archives_need_an_index() -> anyhow::Result<()> {
        let server = create_test_server().await?;
        let archive = zip_bytes(&[("docs/readme.txt", b"hello")]);

        let response = server
            .post("/api/v1/fileserver/compress")
            .multipart(upload("site.zip", archive))
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "invalid_index");

        Ok(())
    }

    #[tokio::test]
    async fn oversized_archives_hit_the_file_limit() -> anyhow::Result<()> {
        let mut config = testing::config();
        config.max_size = 16;
        let server = create_test_server_with_config(routes, &config).await?;

        let response = server
            .post("/api/v1/fileserver/compress")
            .multipart(upload("site.zip", vec![0; 64]))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "file_limit");

        Ok(())
    }

    #[tokio::test]
    async fn uploads_without_a_file_are_bad_requests() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server
            .post("/api/v1/fileserver/compress")
            .multipart(MultipartForm::new().add_text("appID", "app"))
            .expect_failure()
            .await;

        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn missing_blobs_do_not_exist() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server
            .get("/api/v1/fileserver/blob/app/abc/index.html")
            .expect_failure()
            .await;

        response.assert_status_not_found();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "invalid_exist");
        assert_eq!(body["resource"], "app/abc/index.html");

        Ok(())
    }

    #[tokio::test]
    async fn stored_blobs_are_served_with_cache_headers() -> anyhow::Result<()> {
        let state = testing::state(&testing::config()).await?;
        state
            .storage
            .private()
            .write("app/abc/css/site.css", b"body{}".to_vec(), Some("text/css"))
            .await?;
        let server =
            crate::handler::test::create_test_server_with_state(routes(state.clone()), state)
                .await?;

        let response = server.post("/api/v1/fileserver/blob/app/abc/css/site.css").await;

        response.assert_status_ok();
        response.assert_text("body{}");
        assert_eq!(response.header("content-type"), "text/css");
        assert_eq!(response.header("cache-control"), "public, max-age=31536000");

        Ok(())
    }
}
