//! Derivation pipeline - read an original, render both derived assets, store them.
//!
//! Failures anywhere in the pipeline are logged and reported through `DerivationOutcome`,
//! never returned: the original is already stored and a missing thumbnail or preview is a
//! normal state.

use crate::image::{DeriveError, DerivedImages};
use photowall_core::models::DerivedKind;
use photowall_core::Config;
use photowall_storage::LocalAssetStore;
use std::time::Instant;

const PREVIEW_MAX_EDGE: u32 = 1024;
const PREVIEW_QUALITY: u8 = 85;

/// Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationSettings {
    pub thumbnail_size: u32,
    pub thumbnail_quality: u8,
    pub preview_max_edge: u32,
    pub preview_quality: u8,
}

impl Default for DerivationSettings {
    fn default() -> Self {
        Self {
            thumbnail_size: 200,
            thumbnail_quality: 85,
            preview_max_edge: PREVIEW_MAX_EDGE,
            preview_quality: PREVIEW_QUALITY,
        }
    }
}

impl DerivationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            thumbnail_size: config.thumbnail_size,
            thumbnail_quality: config.thumbnail_quality,
            ..Self::default()
        }
    }
}

/// Which derived assets were written by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivationOutcome {
    pub thumbnail: bool,
    pub preview: bool,
}

impl DerivationOutcome {
    pub fn is_complete(&self) -> bool {
        self.thumbnail && self.preview
    }
}

type Rendered = (Result<Vec<u8>, DeriveError>, Result<Vec<u8>, DeriveError>);

#[derive(Clone)]
pub struct DerivationPipeline {
    store: LocalAssetStore,
    settings: DerivationSettings,
}

impl DerivationPipeline {
    pub fn new(store: LocalAssetStore, settings: DerivationSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> DerivationSettings {
        self.settings
    }

    /// Generate thumbnail and preview for a stored original.
    pub async fn run(&self, filename: &str) -> DerivationOutcome {
        let start = Instant::now();
        let mut outcome = DerivationOutcome::default();

        let data = match self.store.read_original(filename).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    filename = %filename,
                    "Failed to read original for derivation"
                );
                return outcome;
            }
        };

        let settings = self.settings;
        let rendered = tokio::task::spawn_blocking(move || render(&data, settings)).await;

        let (thumbnail, preview) = match rendered {
            Ok(Ok(rendered)) => rendered,
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    filename = %filename,
                    "Skipping derived assets, original could not be decoded"
                );
                return outcome;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    filename = %filename,
                    "Derivation task failed"
                );
                return outcome;
            }
        };

        outcome.thumbnail = self
            .store_rendered(DerivedKind::Thumbnail, filename, thumbnail)
            .await;
        outcome.preview = self
            .store_rendered(DerivedKind::Preview, filename, preview)
            .await;

        tracing::info!(
            filename = %filename,
            thumbnail = outcome.thumbnail,
            preview = outcome.preview,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Derived assets generated"
        );

        outcome
    }

    async fn store_rendered(
        &self,
        kind: DerivedKind,
        filename: &str,
        rendered: Result<Vec<u8>, DeriveError>,
    ) -> bool {
        let bytes = match rendered {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    filename = %filename,
                    kind = %kind,
                    "Failed to render derived asset"
                );
                return false;
            }
        };

        match self.store.write_derived(kind, filename, &bytes).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    filename = %filename,
                    kind = %kind,
                    "Failed to store derived asset"
                );
                false
            }
        }
    }
}

/// Decode once, render both assets. A decode failure fails both.
fn render(data: &[u8], settings: DerivationSettings) -> Result<Rendered, DeriveError> {
    let img = DerivedImages::decode(data)?;
    let thumbnail =
        DerivedImages::thumbnail(&img, settings.thumbnail_size, settings.thumbnail_quality);
    let preview = DerivedImages::preview(&img, settings.preview_max_edge, settings.preview_quality);
    Ok((thumbnail, preview))
}
