//! Core domain types and shared logic for the imgapi image repository.
//!
//! This crate defines the data model used across all other crates:
//! - Content digests used as storage keys
//! - Image resource metadata
//! - Media types served by the API
//! - Localized resource names
//! - Typed service configuration

pub mod config;
pub mod digest;
pub mod error;
pub mod image;
pub mod locale;
pub mod media;

pub use digest::{DigestHasher, ImageDigest};
pub use error::{Error, Result};
pub use crate::image::Image;
pub use locale::{Language, ResourceNames, ResourcePaths};

/// Default thumbnail height in pixels.
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 80;

/// Name of the multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "image";
