//! In-process resizer built on the `image` crate.

use super::Resizer;
use crate::error::{DeriveError, DeriveResult};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Decodes any format the `image` crate understands and writes a PNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinResizer;

impl BuiltinResizer {
    pub fn new() -> Self {
        Self
    }
}

/// Width that keeps the aspect ratio at `target_height`, never below one pixel.
fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return 1;
    }
    let scaled = (u64::from(width) * u64::from(target_height) + u64::from(height) / 2)
        / u64::from(height);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Set when the awaiting future is dropped, e.g. by a derivation timeout.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn ensure_live(cancelled: &AtomicBool) -> DeriveResult<()> {
    if cancelled.load(Ordering::Relaxed) {
        return Err(DeriveError::Failed("resize cancelled".to_string()));
    }
    Ok(())
}

/// Decode, resize and encode, checking `cancelled` between stages.
///
/// A job cancelled after it started writing removes its own output.
fn resize_blocking(
    input: &Path,
    output: &Path,
    target_height: u32,
    cancelled: &AtomicBool,
) -> DeriveResult<()> {
    ensure_live(cancelled)?;
    let decoded = ImageReader::open(input)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| DeriveError::Failed(format!("decode {}: {e}", input.display())))?;

    ensure_live(cancelled)?;
    let width = scaled_width(decoded.width(), decoded.height(), target_height);
    let resized = decoded.resize_exact(width, target_height, FilterType::Lanczos3);

    ensure_live(cancelled)?;
    let saved = resized
        .to_rgba8()
        .save_with_format(output, ImageFormat::Png)
        .map_err(|e| DeriveError::Failed(format!("encode {}: {e}", output.display())))
        .and_then(|()| ensure_live(cancelled));
    if saved.is_err() {
        let _ = std::fs::remove_file(output);
    }
    saved
}

#[async_trait]
impl Resizer for BuiltinResizer {
    async fn resize_to_height(
        &self,
        input: &Path,
        output: &Path,
        height: u32,
    ) -> DeriveResult<()> {
        let input: PathBuf = input.to_path_buf();
        let output: PathBuf = output.to_path_buf();
        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancelled.clone());
        tokio::task::spawn_blocking(move || resize_blocking(&input, &output, height, &cancelled))
            .await
            .map_err(|e| DeriveError::Failed(format!("resize task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}
