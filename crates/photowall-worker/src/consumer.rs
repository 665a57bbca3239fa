//! Derivation worker: pops filenames and runs the derivation pipeline on each.

use crate::error::QueueError;
use crate::queue::WorkQueue;
use photowall_processing::{DerivationOutcome, DerivationPipeline};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cap on the pause after consecutive queue failures.
const MAX_BACKOFF_SECS: u64 = 30;

pub struct DerivationWorker {
    queue: Arc<dyn WorkQueue>,
    pipeline: DerivationPipeline,
    poll_timeout: Duration,
}

impl DerivationWorker {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        pipeline: DerivationPipeline,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            pipeline,
            poll_timeout,
        }
    }

    /// Wait up to the poll timeout for one item and process it.
    pub async fn process_next(&self) -> Result<Option<(String, DerivationOutcome)>, QueueError> {
        let Some(filename) = self.queue.dequeue_blocking(self.poll_timeout).await? else {
            return Ok(None);
        };

        tracing::debug!(queue = %self.queue.name(), filename = %filename, "Processing queued item");
        let outcome = self.pipeline.run(&filename).await;
        Ok(Some((filename, outcome)))
    }

    /// Consume until `shutdown` is cancelled or the queue is closed.
    ///
    /// An item already popped is always finished before the loop exits.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            queue = %self.queue.name(),
            poll_timeout_secs = self.poll_timeout.as_secs(),
            "Derivation worker started"
        );

        let mut failures: u32 = 0;

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.queue.dequeue_blocking(self.poll_timeout) => next,
            };

            match next {
                Ok(Some(filename)) => {
                    failures = 0;
                    let outcome = self.pipeline.run(&filename).await;
                    if !outcome.is_complete() {
                        tracing::warn!(
                            filename = %filename,
                            thumbnail = outcome.thumbnail,
                            preview = outcome.preview,
                            "Queued item finished without all derived assets"
                        );
                    }
                }
                Ok(None) => {
                    failures = 0;
                    tracing::trace!("No work available");
                }
                Err(QueueError::Closed) => {
                    tracing::info!("Work queue closed");
                    break;
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let backoff = Duration::from_secs(
                        2_u64.saturating_pow(failures.min(6)).min(MAX_BACKOFF_SECS),
                    );
                    tracing::warn!(
                        error = %e,
                        consecutive_failures = failures,
                        backoff_secs = backoff.as_secs(),
                        "Failed to read from work queue, retrying"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        tracing::info!(queue = %self.queue.name(), "Derivation worker stopped");
    }
}
