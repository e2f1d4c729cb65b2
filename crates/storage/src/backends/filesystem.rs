//! Local filesystem blob store.
//!
//! Originals live in one flat directory, each file named by the lowercase hex
//! digest of its content. Writes go to a hidden temp file that is fsynced and
//! then published under the final name, so readers never observe a partial
//! blob.

use crate::error::{StorageError, StorageResult};
use crate::traits::{BlobStore, BlobStream, PutOutcome, StoredBlob};
use async_trait::async_trait;
use bytes::Bytes;
use imgapi_core::ImageDigest;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Local filesystem blob store.
pub struct FilesystemBlobStore {
    dir: PathBuf,
}

fn unavailable(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Unavailable(format!("{}: {err}", path.display()))
}

/// Temp files are hidden so directory scans skip them.
fn is_temp_name(name: &str) -> bool {
    name.starts_with('.')
}

impl FilesystemBlobStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| unavailable(&dir, e))?;
        Ok(Self { dir })
    }

    /// Directory holding the originals.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path derived solely from the digest.
    fn blob_path(&self, digest: &ImageDigest) -> PathBuf {
        self.dir.join(digest.to_hex())
    }

    /// Write `data` to `temp_path` and publish it at `path`.
    ///
    /// Returns whether this call published the blob. Publishing uses a hard
    /// link, which fails if another writer got there first; filesystems
    /// without hard links fall back to rename.
    async fn publish(&self, temp_path: &Path, path: &Path, data: &[u8]) -> StorageResult<bool> {
        {
            let mut file = fs::File::create(temp_path)
                .await
                .map_err(|e| unavailable(temp_path, e))?;
            file.write_all(data)
                .await
                .map_err(|e| unavailable(temp_path, e))?;
            file.sync_all()
                .await
                .map_err(|e| unavailable(temp_path, e))?;
        }

        let created = match fs::hard_link(temp_path, path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => false,
            Err(e) => {
                tracing::debug!(error = %e, "hard link failed, falling back to rename");
                fs::rename(temp_path, path)
                    .await
                    .map_err(|e| unavailable(path, e))?;
                true
            }
        };

        // After a rename the temp file is already gone
        let _ = fs::remove_file(temp_path).await;
        Ok(created)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put(&self, data: Bytes) -> StorageResult<PutOutcome> {
        let digest = ImageDigest::compute(&data);
        let path = self.blob_path(&digest);

        if fs::try_exists(&path)
            .await
            .map_err(|e| unavailable(&path, e))?
        {
            tracing::debug!(%digest, "Blob already stored, skipping write");
            return Ok(PutOutcome {
                digest,
                path,
                created: false,
            });
        }

        // The directory may have been removed since startup
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| unavailable(&self.dir, e))?;

        let temp_path = self.dir.join(format!(".{digest}.tmp.{}", Uuid::new_v4()));
        let created = match self.publish(&temp_path, &path, &data).await {
            Ok(created) => created,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        if created {
            tracing::info!(%digest, path = %path.display(), "Stored new blob");
        } else {
            tracing::debug!(%digest, "Concurrent writer stored blob first");
        }

        Ok(PutOutcome {
            digest,
            path,
            created,
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn path_for(&self, digest: &ImageDigest) -> StorageResult<PathBuf> {
        let path = self.blob_path(digest);
        if fs::try_exists(&path).await? {
            Ok(path)
        } else {
            Err(StorageError::NotFound(digest.to_hex()))
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read_at(&self, path: &Path) -> StorageResult<Bytes> {
        let data = fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.display().to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn list_all(&self) -> StorageResult<BlobStream> {
        let dir = self.dir.clone();

        // Treat a missing directory as empty, but surface other I/O errors
        let dir_exists = match fs::try_exists(&dir).await {
            Ok(exists) => exists,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(unavailable(&dir, e)),
        };

        let stream = async_stream::try_stream! {
            if !dir_exists {
                return;
            }

            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                // file_type() does not follow symlinks
                let file_type = entry.file_type().await?;
                if !file_type.is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy().to_string();
                if is_temp_name(&file_name) {
                    continue;
                }

                let path = entry.path();
                let data = fs::read(&path).await?;
                let digest = ImageDigest::compute(&data);
                if file_name != digest.to_hex() {
                    tracing::warn!(
                        %digest,
                        file_name = %file_name,
                        "Stored blob name does not match its content digest"
                    );
                }

                yield StoredBlob { digest, path, file_name };
            }
        };

        Ok(Box::pin(stream))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.dir)
            .await
            .map_err(|e| unavailable(&self.dir, e))?;

        if !metadata.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "storage root is not a directory: {}",
                self.dir.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(StorageError::Unavailable(format!(
                "storage root is read-only: {}",
                self.dir.display()
            )));
        }

        Ok(())
    }
}
