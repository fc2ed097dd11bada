//! Archive ingestion: hash, validate, expand and publish an uploaded archive.

mod error;
mod publisher;
mod store;
#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use kiosk_archive::{
    BlobLocator, BlobTemplate, ExpandLimits, Expander, FormatRegistry, content_hash, resolve_index,
};

pub use self::error::{IngestError, PublishError};
pub use self::publisher::{Publication, Publisher};
pub use self::store::{ArchiveLedger, ObjectSink};

/// Tracing target for archive ingestion.
pub(crate) const TRACING_TARGET: &str = "kiosk_server::service::ingest";

/// Prefix of every scratch directory.
const SCRATCH_PREFIX: &str = "kiosk-";

/// An archive as received from a client.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Application the archive belongs to.
    pub app_id: String,
    /// File name the archive was uploaded under; its extension selects the format.
    pub file_name: String,
    pub data: Bytes,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// Public URL of the entry document.
    pub url: String,
    pub content_hash: String,
    /// Path of the entry document inside the tree.
    pub index: String,
    /// Number of files published.
    pub files: usize,
}

/// Turns uploaded archives into published trees.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct IngestService {
    inner: Arc<IngestServiceInner>,
}

#[derive(Debug)]
struct IngestServiceInner {
    expander: Expander,
    template: BlobTemplate,
    scratch_dir: PathBuf,
}

impl IngestService {
    /// Creates a service expanding into directories created under `scratch_dir`.
    pub fn new(expander: Expander, template: BlobTemplate, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(IngestServiceInner {
                expander,
                template,
                scratch_dir: scratch_dir.into(),
            }),
        }
    }

    /// Creates a service with the standard formats.
    pub fn standard(
        limits: ExpandLimits,
        template: BlobTemplate,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            Expander::new(FormatRegistry::standard(), limits),
            template,
            scratch_dir,
        )
    }

    #[inline]
    pub fn template(&self) -> &BlobTemplate {
        &self.inner.template
    }

    #[inline]
    pub fn scratch_dir(&self) -> &Path {
        &self.inner.scratch_dir
    }

    /// Returns `true` if `file_name` has the extension of a supported format.
    pub fn is_archive(&self, file_name: &str) -> bool {
        self.inner.expander.registry().is_archive(file_name)
    }

    /// Ingests one archive.
    ///
    /// The entry document is located before anything touches disk. The tree
    /// is expanded into a fresh scratch directory, which is removed on every
    /// path out of this function.
    pub async fn ingest<S, L>(
        &self,
        sink: &S,
        ledger: &L,
        request: IngestRequest,
    ) -> Result<Ingested, IngestError>
    where
        S: ObjectSink,
        L: ArchiveLedger,
    {
        let IngestRequest {
            app_id,
            file_name,
            data,
        } = request;

        let format = self
            .inner
            .expander
            .registry()
            .for_file_name(&file_name)
            .ok_or_else(|| IngestError::UnsupportedFormat(file_name.clone()))?;

        let (hash, index) = {
            let format = format.clone();
            let data = data.clone();
            tokio::task::spawn_blocking(move || {
                (content_hash(&data), resolve_index(format.as_ref(), &data))
            })
            .await?
        };
        let index = index.map_err(IngestError::from_resolve)?;

        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.inner.scratch_dir)
            .map_err(IngestError::Scratch)?;

        let tree = {
            let expander = self.inner.expander.clone();
            let data = data.clone();
            let root = scratch.path().to_path_buf();
            tokio::task::spawn_blocking(move || expander.expand(&data, format.as_ref(), &root))
                .await?
                .map_err(IngestError::from_expand)?
        };

        tracing::debug!(
            target: TRACING_TARGET,
            app_id = %app_id,
            hash = %hash,
            index = %index,
            bytes = tree.total_bytes(),
            "Archive expanded"
        );

        let locator = BlobLocator::new(&app_id, &hash, &index);
        let published = Publisher::new(sink, ledger, &self.inner.template)
            .publish(Publication {
                index: locator,
                archive_name: &file_name,
                archive: data,
                tree: &tree,
            })
            .await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(error) = scratch.close() {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %scratch_path.display(),
                error = %error,
                "Failed to remove scratch directory"
            );
        }

        let url = published?;
        let files = tree.files().count();

        tracing::info!(
            target: TRACING_TARGET,
            app_id = %app_id,
            hash = %hash,
            index = %index,
            files,
            "Archive published"
        );

        Ok(Ingested {
            url,
            content_hash: hash,
            index,
            files,
        })
    }
}
