//! Configuration types shared across crates.

use crate::locale::Language;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port replacing the one in `bind` (also read from `IMG_API_PORT`).
    #[serde(default)]
    pub port: Option<u16>,
    /// Language of the resource names in URLs.
    #[serde(default)]
    pub language: Language,
    /// Absolute origin used in Location headers and hypermedia documents
    /// (e.g., "https://img.example.org"). Derived from the Host header if unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Maximum accepted request body size for uploads, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: None,
            language: Language::default(),
            public_base_url: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// Listen address: `bind`, with its port replaced by `port` when set.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        let mut addr: SocketAddr = self
            .bind
            .parse()
            .map_err(|e| format!("server.bind {:?} is not a socket address: {e}", self.bind))?;
        if let Some(port) = self.port {
            addr.set_port(port);
        }
        Ok(addr)
    }
}

/// Storage layout configuration.
///
/// Originals and thumbnails live in two flat directories under `root`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all persisted state.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Directory (relative to root) holding originals named by digest.
    #[serde(default = "default_originals_dir")]
    pub originals_dir: String,
    /// Directory (relative to root) holding thumbnails named by digest.
    #[serde(default = "default_thumbnails_dir")]
    pub thumbnails_dir: String,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_originals_dir() -> String {
    "originals".to_string()
}

fn default_thumbnails_dir() -> String {
    "thumbnails".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            originals_dir: default_originals_dir(),
            thumbnails_dir: default_thumbnails_dir(),
        }
    }
}

impl StorageConfig {
    pub fn originals_path(&self) -> PathBuf {
        self.root.join(&self.originals_dir)
    }

    pub fn thumbnails_path(&self) -> PathBuf {
        self.root.join(&self.thumbnails_dir)
    }

    /// Validate storage configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("originals_dir", &self.originals_dir),
            ("thumbnails_dir", &self.thumbnails_dir),
        ] {
            if value.is_empty() {
                return Err(format!("storage.{field} must not be empty"));
            }
            let mut components = Path::new(value).components();
            let single_normal = matches!(
                (components.next(), components.next()),
                (Some(std::path::Component::Normal(_)), None)
            );
            if !single_normal {
                return Err(format!(
                    "storage.{field} must be a single directory name, got {value:?}"
                ));
            }
        }
        if self.originals_dir == self.thumbnails_dir {
            return Err("storage.originals_dir and storage.thumbnails_dir must differ".to_string());
        }
        Ok(())
    }
}

/// Resize backend used to derive thumbnails.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResizeBackendConfig {
    /// In-process resize with the `image` crate.
    #[default]
    Builtin,
    /// External resize-to-height executable.
    Command {
        /// Program to execute (e.g., "convert").
        program: String,
        /// Arguments; `{input}`, `{output}` and `{height}` are substituted.
        #[serde(default = "default_command_args")]
        args: Vec<String>,
    },
}

fn default_command_args() -> Vec<String> {
    ["{input}", "-resize", "x{height}", "{output}"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Thumbnail derivation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Target height in pixels; width follows the aspect ratio.
    #[serde(default = "default_thumbnail_height")]
    pub height: u32,
    /// Serve an existing thumbnail file instead of regenerating it.
    #[serde(default)]
    pub reuse_existing: bool,
    /// Upper bound on a single resize operation, in seconds.
    #[serde(default = "default_thumbnail_timeout_secs")]
    pub timeout_secs: u64,
    /// Resize backend.
    #[serde(default)]
    pub backend: ResizeBackendConfig,
}

fn default_thumbnail_height() -> u32 {
    crate::DEFAULT_THUMBNAIL_HEIGHT
}

fn default_thumbnail_timeout_secs() -> u64 {
    30
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            height: default_thumbnail_height(),
            reuse_existing: false,
            timeout_secs: default_thumbnail_timeout_secs(),
            backend: ResizeBackendConfig::default(),
        }
    }
}

impl ThumbnailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate thumbnail configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.height == 0 {
            return Err("thumbnail.height must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("thumbnail.timeout_secs must be greater than 0".to_string());
        }
        if let ResizeBackendConfig::Command { program, .. } = &self.backend
            && program.trim().is_empty()
        {
            return Err("thumbnail.backend.program must not be empty".to_string());
        }
        Ok(())
    }
}

/// Template configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory whose files override built-in templates of the same name.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Full application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
}

impl AppConfig {
    /// Create a configuration rooted at `root`, for tests.
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                root: root.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> crate::Result<()> {
        self.server
            .bind_addr()
            .and_then(|_| self.storage.validate())
            .and_then(|()| self.thumbnail.validate())
            .map_err(crate::Error::InvalidConfig)
    }
}
