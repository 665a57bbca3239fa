//! Application state shared by every handler.

use crate::services::{CatalogService, IngestService};
use photowall_core::{Config, UrlBuilder};
use photowall_storage::LocalAssetStore;
use photowall_worker::WorkDispatcher;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: LocalAssetStore,
    pub urls: UrlBuilder,
    pub catalog: CatalogService,
    pub ingest: IngestService,
    /// Present only when derivation is queued.
    pub dispatcher: Option<WorkDispatcher>,
    /// Cancels background tasks owned by this process (the in-process worker).
    pub background: CancellationToken,
}

impl AppState {
    /// Stop background work and release the queue client.
    pub async fn shutdown(&self) {
        self.background.cancel();
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.queue().close().await;
        }
    }
}
