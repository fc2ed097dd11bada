//! Pushes an expanded tree and its raw archive to the object store.

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use kiosk_archive::{
    BlobLocator, BlobTemplate, ExpandedTree, LinkRewriter, TreeEntry, archive_storage_path,
    is_html_document,
};

use super::TRACING_TARGET;
use super::error::PublishError;
use super::store::{ArchiveLedger, ObjectSink};

/// Number of tree files uploaded at once.
const UPLOAD_CONCURRENCY: usize = 8;

/// One expanded upload ready to be published.
#[derive(Debug)]
pub struct Publication<'a> {
    /// Locator of the entry document.
    pub index: BlobLocator<'a>,
    /// Name the archive was uploaded under.
    pub archive_name: &'a str,
    /// Raw archive bytes.
    pub archive: Bytes,
    /// Expanded contents on scratch storage.
    pub tree: &'a ExpandedTree,
}

/// Uploads trees and archives through an [`ObjectSink`], recording archives in
/// an [`ArchiveLedger`].
pub struct Publisher<'a, S, L> {
    sink: &'a S,
    ledger: &'a L,
    template: &'a BlobTemplate,
}

impl<'a, S, L> Publisher<'a, S, L>
where
    S: ObjectSink,
    L: ArchiveLedger,
{
    pub fn new(sink: &'a S, ledger: &'a L, template: &'a BlobTemplate) -> Self {
        Self {
            sink,
            ledger,
            template,
        }
    }

    /// Uploads the tree and the archive concurrently and returns the public
    /// URL of the entry document.
    ///
    /// Both uploads run to completion; the first error is reported.
    pub async fn publish(&self, publication: Publication<'_>) -> Result<String, PublishError> {
        let (tree, archive) = tokio::join!(
            self.publish_tree(&publication.index, publication.tree),
            self.publish_archive(
                &publication.index,
                publication.archive_name,
                publication.archive.clone(),
            ),
        );

        tree?;
        archive?;

        Ok(self.template.render(&publication.index))
    }

    async fn publish_tree(
        &self,
        index: &BlobLocator<'_>,
        tree: &ExpandedTree,
    ) -> Result<(), PublishError> {
        let rewriter = LinkRewriter::new(self.template, index.app_id, index.content_hash);

        stream::iter(tree.files().map(Ok::<_, PublishError>))
            .try_for_each_concurrent(UPLOAD_CONCURRENCY, |entry| {
                self.publish_file(index, tree, entry, &rewriter)
            })
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            app_id = index.app_id,
            hash = index.content_hash,
            files = tree.files().count(),
            "Tree uploaded"
        );

        Ok(())
    }

    async fn publish_file(
        &self,
        index: &BlobLocator<'_>,
        tree: &ExpandedTree,
        entry: &TreeEntry,
        rewriter: &LinkRewriter<'_>,
    ) -> Result<(), PublishError> {
        let path = tree.absolute_path(entry);
        let mut body = tokio::fs::read(&path)
            .await
            .map_err(|source| PublishError::Scratch { path, source })?;

        if is_html_document(&entry.path) {
            body = rewriter.rewrite(&entry.path, &body)?;
        }

        let key = index.with_file_name(&entry.path).storage_key();
        let content_type = mime_guess::from_path(&entry.path).first_or_octet_stream();

        self.sink
            .put(&key, body, content_type.as_ref())
            .await
            .map_err(|source| PublishError::Upload { key, source })
    }

    /// Stores the raw archive unless it was published before.
    ///
    /// The ledger record is written first and removed again if the upload
    /// fails, so a record never outlives a failed upload.
    async fn publish_archive(
        &self,
        index: &BlobLocator<'_>,
        archive_name: &str,
        archive: Bytes,
    ) -> Result<(), PublishError> {
        let key = archive_storage_path(index, archive_name);

        if self.ledger.find(&key).await?.is_some() {
            tracing::debug!(target: TRACING_TARGET, key = %key, "Archive already published");
            return Ok(());
        }

        let record = self.ledger.create(&key).await?;
        let content_type = mime_guess::from_path(archive_name).first_or_octet_stream();

        if let Err(source) = self
            .sink
            .put(&key, archive.to_vec(), content_type.as_ref())
            .await
        {
            if let Err(error) = self.ledger.delete(record).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    key = %key,
                    error = %error,
                    "Failed to remove ledger record of an unpublished archive"
                );
            }

            return Err(PublishError::Upload { key, source });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kiosk_archive::{ExpandLimits, Expander, FormatRegistry, ZipFormat};

    use super::*;
    use crate::service::ingest::store::memory::{MemoryLedger, MemorySink};
    use crate::service::ingest::testing::zip_bytes;

    const HASH: &str = "8c6f1e0d";

    fn expand(archive: &[u8], dir: &tempfile::TempDir) -> ExpandedTree {
        Expander::new(FormatRegistry::standard(), ExpandLimits::default())
            .expand(archive, &ZipFormat, dir.path())
            .unwrap()
    }

    fn site() -> Vec<u8> {
        zip_bytes(&[
            ("site/index.html", b"<img src=\"logo.png\">".as_slice()),
            ("site/logo.png", b"png".as_slice()),
        ])
    }

    #[tokio::test]
    async fn uploads_tree_and_archive() {
        let archive = site();
        let dir = tempfile::tempdir().unwrap();
        let tree = expand(&archive, &dir);

        let sink = MemorySink::default();
        let ledger = MemoryLedger::default();
        let template = BlobTemplate::default();

        let url = Publisher::new(&sink, &ledger, &template)
            .publish(Publication {
                index: BlobLocator::new("app", HASH, "site/index.html"),
                archive_name: "bundle.zip",
                archive: Bytes::from(archive),
                tree: &tree,
            })
            .await
            .unwrap();

        assert_eq!(url, format!("/blob/app/{HASH}/site/index.html"));
        assert_eq!(
            sink.keys(),
            vec![
                format!("app/{HASH}/site/index.html"),
                format!("app/{HASH}/site/index.zip"),
                format!("app/{HASH}/site/logo.png"),
            ]
        );
        assert_eq!(ledger.paths(), vec![format!("app/{HASH}/site/index.zip")]);

        let html = sink.body(&format!("app/{HASH}/site/index.html")).unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(html.contains(&format!("/blob/app/{HASH}/site/logo.png")));
        assert_eq!(
            sink.content_type(&format!("app/{HASH}/site/logo.png")).as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn skips_archives_already_published() {
        let archive = site();
        let dir = tempfile::tempdir().unwrap();
        let tree = expand(&archive, &dir);

        let sink = MemorySink::default();
        let ledger = MemoryLedger::default();
        ledger.create(&format!("app/{HASH}/site/index.zip")).await.unwrap();
        let template = BlobTemplate::default();

        Publisher::new(&sink, &ledger, &template)
            .publish(Publication {
                index: BlobLocator::new("app", HASH, "site/index.html"),
                archive_name: "bundle.zip",
                archive: Bytes::from(archive),
                tree: &tree,
            })
            .await
            .unwrap();

        assert!(!sink.keys().iter().any(|key| key.ends_with(".zip")));
        assert_eq!(ledger.paths().len(), 1);
    }

    #[tokio::test]
    async fn failed_archive_upload_removes_the_record() {
        let archive = site();
        let dir = tempfile::tempdir().unwrap();
        let tree = expand(&archive, &dir);

        let sink = MemorySink::rejecting(".zip");
        let ledger = MemoryLedger::default();
        let template = BlobTemplate::default();

        let error = Publisher::new(&sink, &ledger, &template)
            .publish(Publication {
                index: BlobLocator::new("app", HASH, "site/index.html"),
                archive_name: "bundle.zip",
                archive: Bytes::from(archive),
                tree: &tree,
            })
            .await
            .unwrap_err();

        assert!(matches!(error, PublishError::Upload { ref key, .. } if key.ends_with("index.zip")));
        assert!(ledger.paths().is_empty());
        // The tree upload still ran to completion.
        assert_eq!(sink.keys().len(), 2);
    }

    #[tokio::test]
    async fn ledger_failure_fails_the_publication() {
        let archive = site();
        let dir = tempfile::tempdir().unwrap();
        let tree = expand(&archive, &dir);

        let sink = MemorySink::default();
        let ledger = MemoryLedger::unavailable();
        let template = BlobTemplate::default();

        let error = Publisher::new(&sink, &ledger, &template)
            .publish(Publication {
                index: BlobLocator::new("app", HASH, "site/index.html"),
                archive_name: "bundle.zip",
                archive: Bytes::from(archive),
                tree: &tree,
            })
            .await
            .unwrap_err();

        assert!(matches!(error, PublishError::Ledger(_)));
    }
}
