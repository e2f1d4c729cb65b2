//! Storage and derivation error types.

use std::time::Duration;
use thiserror::Error;

/// Blob storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Thumbnail derivation errors. Fatal for the request, never retried.
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("thumbnail derivation failed: {0}")]
    Failed(String),

    #[error("thumbnail derivation timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for thumbnail derivation.
pub type DeriveResult<T> = std::result::Result<T, DeriveError>;
