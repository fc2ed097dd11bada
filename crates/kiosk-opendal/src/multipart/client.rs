//! S3 multipart uploads through the AWS SDK.

use std::fmt;
use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};

use crate::TRACING_TARGET_MULTIPART;
use crate::config::{BackendType, StorageConfig};
use crate::error::{StorageError, StorageResult};

/// Name reported for the static credentials taken from [`StorageConfig`].
const CREDENTIALS_PROVIDER: &str = "kiosk-storage-config";

/// An uploaded part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub number: u32,
    /// ETag as returned by the store.
    pub etag: String,
}

/// Multipart upload client for an S3-compatible endpoint.
///
/// Requests use path-style addressing: `{endpoint}/{bucket}/{key}`.
#[derive(Clone)]
pub struct MultipartClient {
    client: Client,
    url_expire: Duration,
}

impl MultipartClient {
    /// Creates a client from the storage configuration.
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        if config.storage_backend != BackendType::S3 {
            return Err(StorageError::init("multipart uploads need the s3 backend"));
        }

        let (Some(access_key), Some(secret_key)) =
            (&config.storage_access_key, &config.storage_secret_key)
        else {
            return Err(StorageError::init("multipart uploads need storage credentials"));
        };

        let credentials = Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let s3_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.storage_region.clone()))
            .endpoint_url(&config.storage_endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            url_expire: config.url_expire(),
        })
    }

    /// Starts a multipart upload and returns its id.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MULTIPART)]
    pub async fn create(&self, bucket: &str, key: &str, content_type: &str) -> StorageResult<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(sdk_error)?;

        let upload_id = output
            .upload_id()
            .ok_or_else(|| StorageError::multipart("response carries no UploadId"))?
            .to_owned();

        tracing::debug!(target: TRACING_TARGET_MULTIPART, upload_id = %upload_id, "Multipart upload created");
        Ok(upload_id)
    }

    /// Lists every uploaded part, following pagination.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MULTIPART)]
    pub async fn list_parts(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<Vec<Part>> {
        let mut stream = self
            .client
            .list_parts()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .into_paginator()
            .items()
            .send();

        let mut parts = Vec::new();
        while let Some(part) = stream.next().await {
            let part = part.map_err(sdk_error)?;

            let number = part
                .part_number()
                .and_then(|number| u32::try_from(number).ok())
                .ok_or_else(|| StorageError::multipart("part without a valid PartNumber"))?;
            let etag = part
                .e_tag()
                .ok_or_else(|| StorageError::multipart("part without an ETag"))?
                .to_owned();

            parts.push(Part { number, etag });
        }

        Ok(parts)
    }

    /// Returns a presigned URL for uploading one part.
    pub async fn upload_part_url(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
    ) -> StorageResult<String> {
        let part_number = i32::try_from(part_number)
            .map_err(|_| StorageError::multipart("part number out of range"))?;
        let presigning = PresigningConfig::expires_in(self.url_expire)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let request = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_owned())
    }

    /// Completes an upload using the parts the store already holds.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MULTIPART)]
    pub async fn complete(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<()> {
        let parts = self.list_parts(bucket, key, upload_id).await?;
        if parts.is_empty() {
            return Err(StorageError::multipart("no parts have been uploaded"));
        }

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_upload(&parts))
            .send()
            .await
            .map_err(sdk_error)?;

        tracing::info!(
            target: TRACING_TARGET_MULTIPART,
            parts = parts.len(),
            "Multipart upload completed"
        );
        Ok(())
    }

    /// Aborts an upload and discards its parts.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MULTIPART)]
    pub async fn abort(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}

impl fmt::Debug for MultipartClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartClient")
            .field("url_expire", &self.url_expire)
            .finish_non_exhaustive()
    }
}

/// Builds the completion body with parts in ascending order.
fn completed_upload(parts: &[Part]) -> CompletedMultipartUpload {
    let mut sorted = parts.to_vec();
    sorted.sort_by_key(|part| part.number);

    let parts = sorted
        .into_iter()
        .map(|part| {
            CompletedPart::builder()
                .part_number(part.number as i32)
                .e_tag(part.etag)
                .build()
        })
        .collect();

    CompletedMultipartUpload::builder()
        .set_parts(Some(parts))
        .build()
}

fn sdk_error<E>(error: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = error.raw_response().map(|response| response.status().as_u16());
    let reason = match (error.code(), error.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_owned(),
        _ => DisplayErrorContext(&error).to_string(),
    };

    tracing::warn!(
        target: TRACING_TARGET_MULTIPART,
        status = ?status,
        reason = %reason,
        "Multipart request rejected"
    );

    match status {
        Some(404) => StorageError::NotFound(reason),
        Some(403) => StorageError::PermissionDenied(reason),
        _ => StorageError::multipart(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_config() -> StorageConfig {
        StorageConfig::new("http://localhost:9000", "us-east-1").with_credentials("AKIA", "secret")
    }

    #[test]
    fn completion_orders_parts() {
        let parts = vec![
            Part {
                number: 2,
                etag: "\"b\"".into(),
            },
            Part {
                number: 1,
                etag: "\"a\"".into(),
            },
        ];

        let upload = completed_upload(&parts);
        let numbers: Vec<_> = upload.parts().iter().map(|p| p.part_number()).collect();
        let etags: Vec<_> = upload.parts().iter().map(|p| p.e_tag()).collect();

        assert_eq!(numbers, vec![Some(1), Some(2)]);
        assert_eq!(etags, vec![Some("\"a\""), Some("\"b\"")]);
    }

    #[tokio::test]
    async fn upload_part_url_is_presigned() {
        let client = MultipartClient::new(&s3_config()).unwrap();

        let url = client
            .upload_part_url("private", "app/v.mp4", "abc", 3)
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/private/app/v.mp4?"));
        assert!(url.contains("partNumber=3"));
        assert!(url.contains("uploadId=abc"));
        assert!(url.contains("X-Amz-Expires=600"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[test]
    fn requires_credentials() {
        let config = StorageConfig::new("http://localhost:9000", "us-east-1");
        assert!(MultipartClient::new(&config).is_err());
        assert!(MultipartClient::new(&StorageConfig::memory()).is_err());
    }
}
