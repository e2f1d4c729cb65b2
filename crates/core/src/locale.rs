//! Localized resource names and the URL paths derived from them.

use crate::digest::ImageDigest;
use serde::{Deserialize, Serialize};

/// Language selecting the resource names used in URLs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
    Fr,
}

/// Path segment names for one language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceNames {
    /// Collection of images (`images`, `bilder`, `photos`).
    pub images: &'static str,
    /// Thumbnail sub-resource (`thumbnail`, `miniaturbild`, `miniature`).
    pub thumbnail: &'static str,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Fr => "fr",
        }
    }

    pub fn resource_names(self) -> ResourceNames {
        match self {
            Self::En => ResourceNames {
                images: "images",
                thumbnail: "thumbnail",
            },
            Self::De => ResourceNames {
                images: "bilder",
                thumbnail: "miniaturbild",
            },
            Self::Fr => ResourceNames {
                images: "photos",
                thumbnail: "miniature",
            },
        }
    }
}

/// URL paths of the image resources for a language.
///
/// Route patterns (with a `{digest}` capture) feed the router; the concrete
/// paths feed Location headers and hypermedia documents, so both always agree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourcePaths {
    names: ResourceNames,
}

impl ResourcePaths {
    pub fn new(language: Language) -> Self {
        Self {
            names: language.resource_names(),
        }
    }

    pub fn names(&self) -> ResourceNames {
        self.names
    }

    /// `/images`
    pub fn collection(&self) -> String {
        format!("/{}", self.names.images)
    }

    /// `/images/{digest}`
    pub fn item_route(&self) -> String {
        format!("/{}/{{digest}}", self.names.images)
    }

    /// `/images/{digest}/thumbnail`
    pub fn thumbnail_route(&self) -> String {
        format!("/{}/{{digest}}/{}", self.names.images, self.names.thumbnail)
    }

    pub fn item(&self, digest: &ImageDigest) -> String {
        format!("/{}/{}", self.names.images, digest)
    }

    pub fn thumbnail(&self, digest: &ImageDigest) -> String {
        format!("/{}/{}/{}", self.names.images, digest, self.names.thumbnail)
    }
}
