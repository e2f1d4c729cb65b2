//! Image resource metadata.

use crate::digest::ImageDigest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A stored original image as seen by request handlers.
///
/// `digest` is the identity; `original_name` is display metadata only and
/// never used to address the bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Content digest of the original bytes.
    pub digest: ImageDigest,
    /// Client-supplied filename at upload time.
    pub original_name: String,
    /// Location of the persisted original bytes.
    pub path: PathBuf,
}

impl Image {
    pub fn new(digest: ImageDigest, original_name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            digest,
            original_name: original_name.into(),
            path,
        }
    }
}
