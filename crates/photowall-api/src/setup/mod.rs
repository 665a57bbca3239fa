//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::services::{CatalogService, DerivationStrategy, IngestService};
use crate::state::AppState;
use anyhow::{Context, Result};
use photowall_core::{Config, DerivationMode, QueueBackend, UrlBuilder};
use photowall_processing::{DerivationPipeline, DerivationSettings};
use photowall_storage::LocalAssetStore;
use photowall_worker::{connect_queue, DerivationWorker, WorkDispatcher};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    let state = build_state(&config).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Build the shared state and pick the derivation strategy for this deployment.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>> {
    let with_derived_dirs = config.derivation_mode != DerivationMode::Disabled;
    let store = LocalAssetStore::new(&config.photos_dir, with_derived_dirs).await;
    let urls = UrlBuilder::new(&config.base_url);
    let settings = DerivationSettings::from_config(config);
    let background = CancellationToken::new();

    let (strategy, dispatcher) = match config.derivation_mode {
        DerivationMode::Inline => (
            DerivationStrategy::Inline(DerivationPipeline::new(store.clone(), settings)),
            None,
        ),
        DerivationMode::Queued => {
            let queue = connect_queue(config).context("Failed to configure work queue")?;

            // Nothing outside this process can reach an in-memory queue.
            if config.queue_backend == QueueBackend::Memory {
                let worker = DerivationWorker::new(
                    queue.clone(),
                    DerivationPipeline::new(store.clone(), settings),
                    config.worker_poll_timeout,
                );
                let shutdown = background.clone();
                tokio::spawn(async move { worker.run(shutdown).await });
            }

            let dispatcher = WorkDispatcher::new(queue);
            (DerivationStrategy::Queued(dispatcher.clone()), Some(dispatcher))
        }
        DerivationMode::Disabled => (DerivationStrategy::Disabled, None),
    };

    tracing::info!(
        photos_dir = %config.photos_dir.display(),
        derivation = strategy.name(),
        require_derived_assets = config.require_derived_assets,
        thumbnail_size = settings.thumbnail_size,
        "Application state initialized"
    );

    let catalog = CatalogService::new(store.clone(), urls.clone(), config.require_derived_assets);
    let ingest = IngestService::new(store.clone(), strategy);

    Ok(Arc::new(AppState {
        config: config.clone(),
        store,
        urls,
        catalog,
        ingest,
        dispatcher,
        background,
    }))
}
