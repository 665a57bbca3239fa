//! In-process queue for single-binary deployments and tests.

use crate::error::QueueError;
use crate::queue::WorkQueue;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

pub struct MemoryWorkQueue {
    name: String,
    items: Mutex<VecDeque<String>>,
    notify: Notify,
    closed: AtomicBool,
}

impl MemoryWorkQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn pop(&self) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

#[async_trait]
impl WorkQueue for MemoryWorkQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, filename: &str) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }

        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(filename.to_string());
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register before checking so a push between the check and the wait is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.closed.load(Ordering::Acquire) {
                return Err(QueueError::Closed);
            }

            if let Some(item) = self.pop() {
                return Ok(Some(item));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn length(&self) -> Result<u64, QueueError> {
        let len = self
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        Ok(len as u64)
    }

    async fn ping(&self) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
        tracing::debug!(queue = %self.name, "Memory queue closed");
    }
}
