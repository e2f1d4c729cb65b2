//! Startup sequence.
//!
//! The index is rebuilt from the blob store before any state is handed to
//! the router, so no request ever sees a cold index.

use crate::state::AppState;
use crate::templates::Templates;
use anyhow::{Context, Result};
use imgapi_core::config::AppConfig;
use imgapi_storage::{ResourceIndex, thumbnail};

/// Build the application state from configuration.
pub async fn build_state(config: AppConfig) -> Result<AppState> {
    config.validate().context("invalid configuration")?;

    let store = imgapi_storage::from_config(&config.storage)
        .await
        .context("failed to initialize blob store")?;

    // Catch unusable storage roots before accepting requests
    store
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(
        backend = store.backend_name(),
        root = %config.storage.root.display(),
        "Blob store ready"
    );

    let index = ResourceIndex::load(store.as_ref())
        .await
        .context("failed to rebuild resource index")?;
    tracing::info!(images = index.len().await, "Resource index loaded");

    let deriver = thumbnail::from_config(&config.storage, &config.thumbnail);
    tracing::info!(
        height = config.thumbnail.height,
        reuse_existing = config.thumbnail.reuse_existing,
        "Thumbnail deriver configured"
    );

    let templates = Templates::load(config.templates.dir.as_deref())
        .await
        .context("failed to load templates")?;

    Ok(AppState::new(config, store, index, deriver, templates))
}
