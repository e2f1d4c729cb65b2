//! Storage layer for imgapi.
//!
//! This crate provides:
//! - Content-addressed blob storage for original images with atomic, deduplicating writes
//! - The in-memory resource index, rebuilt from blob storage at startup
//! - Thumbnail derivation with pluggable resize backends

pub mod backends;
pub mod error;
pub mod index;
pub mod thumbnail;
pub mod traits;

pub use backends::filesystem::FilesystemBlobStore;
pub use error::{DeriveError, DeriveResult, StorageError, StorageResult};
pub use index::ResourceIndex;
pub use thumbnail::{ResizingDeriver, Resizer, ReusingDeriver, ThumbnailDeriver};
pub use traits::{BlobStore, BlobStream, PutOutcome, StoredBlob};

use imgapi_core::config::StorageConfig;
use std::sync::Arc;

/// Create the blob store for originals from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    config.validate().map_err(StorageError::Config)?;
    let store = FilesystemBlobStore::new(config.originals_path()).await?;
    Ok(Arc::new(store))
}
