//! Application state shared across handlers.

use crate::templates::Templates;
use imgapi_core::ResourcePaths;
use imgapi_core::config::AppConfig;
use imgapi_storage::{BlobStore, ResourceIndex, ThumbnailDeriver};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Store for original image bytes.
    pub store: Arc<dyn BlobStore>,
    /// Digest → image metadata, populated before the router is built.
    pub index: Arc<ResourceIndex>,
    /// Thumbnail derivation policy.
    pub deriver: Arc<dyn ThumbnailDeriver>,
    /// Hypermedia document templates.
    pub templates: Arc<Templates>,
    /// Localized resource paths.
    pub paths: ResourcePaths,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn BlobStore>,
        index: ResourceIndex,
        deriver: Arc<dyn ThumbnailDeriver>,
        templates: Templates,
    ) -> Self {
        let paths = ResourcePaths::new(config.server.language);
        Self {
            config: Arc::new(config),
            store,
            index: Arc::new(index),
            deriver,
            templates: Arc::new(templates),
            paths,
        }
    }
}
