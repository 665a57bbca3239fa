//! Domain models for stored images and their derived assets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions (lowercase, without dot) that the asset store recognises as originals.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Image type as detected from content, never from the client's declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Unknown,
}

impl ImageKind {
    /// Only the four recognised formats may be stored.
    pub fn is_supported(self) -> bool {
        !matches!(self, ImageKind::Unknown)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
            ImageKind::Unknown => "application/octet-stream",
        }
    }

    /// Storage extension for this kind. Unknown content falls back to `jpg`.
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg | ImageKind::Unknown => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }

    /// Parse a declared MIME type, ignoring parameters and case.
    pub fn from_mime(content_type: &str) -> Self {
        let normalized = content_type
            .split(';')
            .next()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match normalized.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => ImageKind::Jpeg,
            "image/png" => ImageKind::Png,
            "image/gif" => ImageKind::Gif,
            "image/webp" => ImageKind::Webp,
            _ => ImageKind::Unknown,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// A derived view of an original, stored under the same filename in its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedKind {
    Thumbnail,
    Preview,
}

impl DerivedKind {
    pub const ALL: [DerivedKind; 2] = [DerivedKind::Thumbnail, DerivedKind::Preview];

    /// Subdirectory under the storage root holding this kind of asset.
    pub fn dir_name(self) -> &'static str {
        match self {
            DerivedKind::Thumbnail => "thumbnails",
            DerivedKind::Preview => "previews",
        }
    }
}

impl fmt::Display for DerivedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedKind::Thumbnail => f.write_str("thumbnail"),
            DerivedKind::Preview => f.write_str("preview"),
        }
    }
}

/// Public catalog record. Derived URLs are present only when the file exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub image_name: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}
