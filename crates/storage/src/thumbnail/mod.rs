//! Thumbnail derivation.
//!
//! A [`ThumbnailDeriver`] turns a stored original into a height-constrained
//! rendition written to the thumbnail directory under the original's digest.
//! The actual pixel work is delegated to a [`Resizer`] backend:
//!
//! | Backend | Implementation |
//! |---|---|
//! | `builtin` | [`BuiltinResizer`], in-process via the `image` crate |
//! | `command` | [`CommandResizer`], an external resize-to-height executable |
//!
//! [`ResizingDeriver`] regenerates on every call. [`ReusingDeriver`] layers an
//! existence check on top without changing the interface callers see.

mod builtin;
mod command;

pub use builtin::BuiltinResizer;
pub use command::CommandResizer;

use crate::error::{DeriveError, DeriveResult};
use async_trait::async_trait;
use imgapi_core::config::{ResizeBackendConfig, StorageConfig, ThumbnailConfig};
use imgapi_core::{Image, ImageDigest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::instrument;
use uuid::Uuid;

/// Resize-to-height backend.
///
/// Implementations must preserve the aspect ratio, fix the output height to
/// `height`, and write a PNG to `output`.
#[async_trait]
pub trait Resizer: Send + Sync + 'static {
    async fn resize_to_height(&self, input: &Path, output: &Path, height: u32)
    -> DeriveResult<()>;

    /// Backend name, for logging.
    fn name(&self) -> &'static str;
}

/// Produces the thumbnail of a stored original.
#[async_trait]
pub trait ThumbnailDeriver: Send + Sync + 'static {
    /// Derive the thumbnail for `image` and return its path.
    async fn derive(&self, image: &Image, target_height: u32) -> DeriveResult<PathBuf>;
}

/// Deriver that always regenerates the thumbnail.
pub struct ResizingDeriver {
    dir: PathBuf,
    resizer: Arc<dyn Resizer>,
    timeout: Duration,
}

impl ResizingDeriver {
    pub fn new(dir: impl Into<PathBuf>, resizer: Arc<dyn Resizer>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            resizer,
            timeout,
        }
    }

    /// Location of the thumbnail for `digest`.
    pub fn thumbnail_path(&self, digest: &ImageDigest) -> PathBuf {
        self.dir.join(digest.to_hex())
    }
}

#[async_trait]
impl ThumbnailDeriver for ResizingDeriver {
    #[instrument(skip(self, image), fields(digest = %image.digest, resizer = self.resizer.name()))]
    async fn derive(&self, image: &Image, target_height: u32) -> DeriveResult<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.thumbnail_path(&image.digest);
        // Each attempt renders into its own scratch directory, removed when the
        // attempt ends; a resizer still running past the timeout cannot write.
        let scratch = self
            .dir
            .join(format!(".{}.tmp.{}", image.digest, Uuid::new_v4()));
        fs::create_dir(&scratch).await?;
        // The .png suffix lets external tools pick the output format
        let temp_path = scratch.join("thumbnail.png");

        let resized = tokio::time::timeout(
            self.timeout,
            self.resizer
                .resize_to_height(&image.path, &temp_path, target_height),
        )
        .await
        .unwrap_or(Err(DeriveError::Timeout(self.timeout)));

        let published = match resized {
            Ok(()) => fs::rename(&temp_path, &path).await.map_err(DeriveError::from),
            Err(e) => Err(e),
        };
        let _ = fs::remove_dir_all(&scratch).await;
        if let Err(e) = published {
            tracing::error!(
                path = %image.path.display(),
                target_height,
                error = %e,
                "Thumbnail derivation failed"
            );
            return Err(e);
        }

        tracing::debug!(path = %path.display(), target_height, "Thumbnail derived");
        Ok(path)
    }
}

/// Deriver that returns an existing thumbnail instead of regenerating it.
pub struct ReusingDeriver {
    inner: ResizingDeriver,
}

impl ReusingDeriver {
    pub fn new(inner: ResizingDeriver) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ThumbnailDeriver for ReusingDeriver {
    async fn derive(&self, image: &Image, target_height: u32) -> DeriveResult<PathBuf> {
        let path = self.inner.thumbnail_path(&image.digest);
        if fs::try_exists(&path).await? {
            tracing::debug!(digest = %image.digest, "Reusing existing thumbnail");
            return Ok(path);
        }
        self.inner.derive(image, target_height).await
    }
}

/// Create the configured resize backend.
pub fn resizer_from_config(config: &ThumbnailConfig) -> Arc<dyn Resizer> {
    match &config.backend {
        ResizeBackendConfig::Builtin => Arc::new(BuiltinResizer::new()),
        ResizeBackendConfig::Command { program, args } => {
            Arc::new(CommandResizer::new(program.clone(), args.clone()))
        }
    }
}

/// Create the configured thumbnail deriver.
pub fn from_config(
    storage: &StorageConfig,
    config: &ThumbnailConfig,
) -> Arc<dyn ThumbnailDeriver> {
    let deriver = ResizingDeriver::new(
        storage.thumbnails_path(),
        resizer_from_config(config),
        config.timeout(),
    );
    if config.reuse_existing {
        Arc::new(ReusingDeriver::new(deriver))
    } else {
        Arc::new(deriver)
    }
}
