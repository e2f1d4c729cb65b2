//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use imgapi_core::ImageDigest;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// A boxed stream of stored blobs, produced by a directory scan.
pub type BlobStream = Pin<Box<dyn Stream<Item = StorageResult<StoredBlob>> + Send>>;

/// Result of a [`BlobStore::put`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutOutcome {
    /// Digest of the written content.
    pub digest: ImageDigest,
    /// Location of the stored bytes.
    pub path: PathBuf,
    /// Whether this call wrote the bytes (false if they were already stored).
    pub created: bool,
}

/// A blob found while scanning storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    /// Digest recomputed from the stored bytes, independent of the file name.
    pub digest: ImageDigest,
    /// Location of the stored bytes.
    pub path: PathBuf,
    /// Base name of the stored file.
    pub file_name: String,
}

/// Content-addressed, deduplicating store for original image bytes.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `data` under its digest. Skips the write if the digest is already stored.
    async fn put(&self, data: Bytes) -> StorageResult<PutOutcome>;

    /// Location of a previously stored digest.
    async fn path_for(&self, digest: &ImageDigest) -> StorageResult<PathBuf>;

    /// Read the bytes stored at a path obtained from this store.
    async fn read_at(&self, path: &Path) -> StorageResult<Bytes>;

    /// Scan storage, recomputing each blob's digest from its content.
    ///
    /// The stream is finite and the scan can be restarted at any time.
    async fn list_all(&self) -> StorageResult<BlobStream>;

    /// Get the name of this storage backend, for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is reachable and writable before accepting requests.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
