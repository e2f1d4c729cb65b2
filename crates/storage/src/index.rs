//! In-memory resource index.
//!
//! Maps digests to image metadata. The index is a projection of the blob
//! store: it is rebuilt from a directory scan at startup and afterwards only
//! grows, one entry per successful upload.

use crate::error::StorageResult;
use crate::traits::BlobStore;
use futures::StreamExt;
use imgapi_core::{Image, ImageDigest};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

/// Concurrently readable, singly written digest → image map.
#[derive(Default)]
pub struct ResourceIndex {
    entries: RwLock<HashMap<ImageDigest, Image>>,
}

impl ResourceIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index populated from `store`.
    ///
    /// Returns only after the scan has completed, so callers holding the
    /// index never observe a cold cache.
    pub async fn load(store: &dyn BlobStore) -> StorageResult<Self> {
        let index = Self::new();
        index.rebuild(store).await?;
        Ok(index)
    }

    /// Clear and repopulate the index from a full scan of `store`.
    ///
    /// Entries are keyed by the digest recomputed from each blob's content.
    /// The write lock is held for the whole scan; on error the previous
    /// entries are kept.
    #[instrument(skip_all, fields(backend = store.backend_name()))]
    pub async fn rebuild(&self, store: &dyn BlobStore) -> StorageResult<usize> {
        let mut guard = self.entries.write().await;

        let mut blobs = store.list_all().await?;
        let mut entries = HashMap::new();
        while let Some(blob) = blobs.next().await {
            let blob = blob?;
            entries.insert(
                blob.digest,
                Image::new(blob.digest, blob.file_name, blob.path),
            );
        }

        let count = entries.len();
        *guard = entries;
        tracing::info!(count, "Resource index rebuilt");
        Ok(count)
    }

    /// Insert or overwrite the entry for `image.digest`.
    ///
    /// Returns the previous entry, if any.
    pub async fn insert(&self, image: Image) -> Option<Image> {
        self.entries.write().await.insert(image.digest, image)
    }

    /// Look up an image by digest.
    pub async fn lookup(&self, digest: &ImageDigest) -> Option<Image> {
        self.entries.read().await.get(digest).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::filesystem::FilesystemBlobStore;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let index = ResourceIndex::new();
        let digest = ImageDigest::compute(b"img");
        assert!(index.lookup(&digest).await.is_none());

        let image = Image::new(digest, "cat.png", "/tmp/x".into());
        assert!(index.insert(image.clone()).await.is_none());
        assert_eq!(index.lookup(&digest).await, Some(image.clone()));

        // Same digest again replaces with an equal value
        assert_eq!(index.insert(image.clone()).await, Some(image));
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path()).await.unwrap();
        let stored = store.put(Bytes::from("on disk")).await.unwrap();

        let index = ResourceIndex::new();
        let stale = ImageDigest::compute(b"only in memory");
        index
            .insert(Image::new(stale, "stale.png", "/nowhere".into()))
            .await;

        let count = index.rebuild(&store).await.unwrap();
        assert_eq!(count, 1);
        assert!(index.lookup(&stale).await.is_none());

        let image = index.lookup(&stored.digest).await.unwrap();
        assert_eq!(image.path, stored.path);
        assert_eq!(image.original_name, stored.digest.to_hex());
    }
}
