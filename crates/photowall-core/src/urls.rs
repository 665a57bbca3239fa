//! Public URL construction for originals and derived assets.

use crate::models::DerivedKind;

/// Path prefix under which the media directory is served.
pub const MEDIA_PREFIX: &str = "/media";

/// Builds externally addressable URLs from the configured base URL.
#[derive(Clone, Debug)]
pub struct UrlBuilder {
    base_url: String,
}

impl UrlBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn image_url(&self, filename: &str) -> String {
        format!("{}{}/{}", self.base_url, MEDIA_PREFIX, filename)
    }

    pub fn thumbnail_url(&self, filename: &str) -> String {
        self.derived_url(DerivedKind::Thumbnail, filename)
    }

    pub fn preview_url(&self, filename: &str) -> String {
        self.derived_url(DerivedKind::Preview, filename)
    }

    pub fn derived_url(&self, kind: DerivedKind, filename: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.base_url,
            MEDIA_PREFIX,
            kind.dir_name(),
            filename
        )
    }
}
