use crate::error::QueueError;
use crate::queue::WorkQueue;
use std::sync::Arc;

/// Hands stored filenames to derivation workers.
///
/// Dispatch is best-effort: by the time it runs the upload has already succeeded, so a
/// failure is logged and reported as `false`, never propagated.
#[derive(Clone)]
pub struct WorkDispatcher {
    queue: Arc<dyn WorkQueue>,
}

impl WorkDispatcher {
    pub fn new(queue: Arc<dyn WorkQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<dyn WorkQueue> {
        &self.queue
    }

    pub async fn dispatch(&self, filename: &str) -> bool {
        match self.queue.enqueue(filename).await {
            Ok(()) => {
                tracing::info!(
                    queue = %self.queue.name(),
                    filename = %filename,
                    "Derivation job queued"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    queue = %self.queue.name(),
                    filename = %filename,
                    "Failed to queue derivation job, upload kept without derived assets"
                );
                false
            }
        }
    }

    pub async fn length(&self) -> Result<u64, QueueError> {
        self.queue.length().await
    }

    pub async fn ping(&self) -> Result<(), QueueError> {
        self.queue.ping().await
    }
}
