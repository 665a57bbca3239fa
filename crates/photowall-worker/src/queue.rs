//! Work queue abstraction.
//!
//! A queue is a single named FIFO list of filenames. Delivery is at-most-once: an item
//! handed to a consumer that then crashes is gone.

use crate::error::QueueError;
use crate::memory::MemoryWorkQueue;
use crate::postgres::PgWorkQueue;
use async_trait::async_trait;
use photowall_core::{Config, QueueBackend};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Queue name, for logs.
    fn name(&self) -> &str;

    /// Append a filename at the tail.
    async fn enqueue(&self, filename: &str) -> Result<(), QueueError>;

    /// Pop the head, waiting up to `timeout` for one to arrive.
    ///
    /// `Ok(None)` means no work was available within the timeout.
    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>, QueueError>;

    /// Number of pending items. Observability only.
    async fn length(&self) -> Result<u64, QueueError>;

    async fn ping(&self) -> Result<(), QueueError>;

    /// Stop accepting work and release connections. Blocked consumers return `Closed`.
    async fn close(&self);
}

/// Build the queue selected by configuration.
///
/// Postgres connections are opened lazily, so an unreachable database does not fail
/// startup; individual operations report `QueueError::Unavailable` instead.
pub fn connect_queue(config: &Config) -> Result<Arc<dyn WorkQueue>, QueueError> {
    match config.queue_backend {
        QueueBackend::Postgres => {
            let queue = PgWorkQueue::connect_lazy(&config.queue_database_url, &config.queue_name)?;
            tracing::info!(queue = %config.queue_name, backend = "postgres", "Work queue configured");
            Ok(Arc::new(queue))
        }
        QueueBackend::Memory => {
            tracing::info!(queue = %config.queue_name, backend = "memory", "Work queue configured");
            Ok(Arc::new(MemoryWorkQueue::new(&config.queue_name)))
        }
    }
}
