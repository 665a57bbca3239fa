//! Catalog service: listing, readiness filtering, pagination and URL resolution.
//!
//! Every request is rebuilt from the directory contents; there is no index to go stale.

use photowall_core::models::DerivedKind;
use photowall_core::{AppError, Photo, UrlBuilder};
use photowall_storage::LocalAssetStore;
use serde::Serialize;
use std::collections::HashSet;

/// One page of the catalog, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub photos: Vec<Photo>,
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Clone)]
pub struct CatalogService {
    store: LocalAssetStore,
    urls: UrlBuilder,
    require_derived_assets: bool,
}

impl CatalogService {
    pub fn new(store: LocalAssetStore, urls: UrlBuilder, require_derived_assets: bool) -> Self {
        Self {
            store,
            urls,
            require_derived_assets,
        }
    }

    /// List page `page` (1-based) of `per_page` items.
    ///
    /// A page past the end is empty, not an error, and still reports `total_pages`.
    /// Listing failures are never partial: any read error fails the whole request.
    pub async fn list_page(&self, page: usize, per_page: usize) -> Result<CatalogPage, AppError> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let mut names = self.store.list_originals().await?;
        let thumbnails = self.store.list_derived(DerivedKind::Thumbnail).await?;
        let previews = self.store.list_derived(DerivedKind::Preview).await?;

        if self.require_derived_assets {
            names.retain(|name| thumbnails.contains(name) && previews.contains(name));
        }

        // Lexical order on the timestamp prefix, newest first.
        names.sort_unstable_by(|a, b| b.cmp(a));

        let count = names.len();
        let total_pages = count.div_ceil(per_page);
        let start = (page - 1).saturating_mul(per_page);

        let photos = if start >= count {
            Vec::new()
        } else {
            let end = start.saturating_add(per_page).min(count);
            names[start..end]
                .iter()
                .map(|name| self.to_photo(name, &thumbnails, &previews))
                .collect()
        };

        tracing::debug!(
            page,
            per_page,
            total_items = count,
            total_pages,
            returned = photos.len(),
            "Catalog page listed"
        );

        Ok(CatalogPage {
            photos,
            page,
            total_pages,
        })
    }

    /// Public record for a single stored original, with derived URLs for assets that exist now.
    pub async fn photo(&self, filename: &str) -> Photo {
        Photo {
            image_name: filename.to_string(),
            image_url: self.urls.image_url(filename),
            thumbnail_url: self
                .store
                .thumbnail_exists(filename)
                .await
                .then(|| self.urls.thumbnail_url(filename)),
            preview_url: self
                .store
                .preview_exists(filename)
                .await
                .then(|| self.urls.preview_url(filename)),
        }
    }

    fn to_photo(
        &self,
        filename: &str,
        thumbnails: &HashSet<String>,
        previews: &HashSet<String>,
    ) -> Photo {
        Photo {
            image_name: filename.to_string(),
            image_url: self.urls.image_url(filename),
            thumbnail_url: thumbnails
                .contains(filename)
                .then(|| self.urls.thumbnail_url(filename)),
            preview_url: previews
                .contains(filename)
                .then(|| self.urls.preview_url(filename)),
        }
    }
}
