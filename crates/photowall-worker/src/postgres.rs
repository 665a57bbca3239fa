//! PostgreSQL-backed queue shared between the API and external workers.
//!
//! Items live in the `work_queue` table. Consumers claim the oldest row with
//! `FOR UPDATE SKIP LOCKED` and delete it in the same statement, so concurrent workers
//! never receive the same filename. Producers `pg_notify` inside the insert transaction
//! to wake blocked consumers immediately.

use crate::error::QueueError;
use crate::queue::WorkQueue;
use async_trait::async_trait;
use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;

/// Channel for LISTEN/NOTIFY. The notification payload is the queue name.
pub const WORK_NOTIFY_CHANNEL: &str = "photowall_work_queue";

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct PgWorkQueue {
    pool: PgPool,
    name: String,
    schema: OnceCell<()>,
    listener: Mutex<Option<PgListener>>,
    closed: AtomicBool,
}

impl PgWorkQueue {
    /// Configure a pool without connecting. The first operation opens the connection.
    pub fn connect_lazy(database_url: &str, queue_name: &str) -> Result<Self, QueueError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool, queue_name))
    }

    pub fn new(pool: PgPool, queue_name: &str) -> Self {
        Self {
            pool,
            name: queue_name.to_string(),
            schema: OnceCell::new(),
            listener: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Run migrations once per process. Retried on the next call after a failure.
    async fn ensure_schema(&self) -> Result<(), QueueError> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::migrate!("./migrations").run(&self.pool).await?;
                tracing::debug!(queue = %self.name, "Work queue schema ready");
                Ok::<(), QueueError>(())
            })
            .await?;
        Ok(())
    }

    fn check_open(&self) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    async fn try_claim(&self) -> Result<Option<String>, QueueError> {
        let payload = sqlx::query_scalar::<_, String>(
            r#"
            DELETE FROM work_queue
            WHERE id = (
                SELECT id
                FROM work_queue
                WHERE queue_name = $1
                ORDER BY id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING payload
            "#,
        )
        .bind(&self.name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload)
    }

    async fn listen(&self) -> Result<PgListener, QueueError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(WORK_NOTIFY_CHANNEL).await?;
        Ok(listener)
    }
}

#[async_trait]
impl WorkQueue for PgWorkQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, filename: &str) -> Result<(), QueueError> {
        self.check_open()?;
        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO work_queue (queue_name, payload) VALUES ($1, $2)")
            .bind(&self.name)
            .bind(filename)
            .execute(&mut *tx)
            .await?;

        // Delivered on commit only.
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(WORK_NOTIFY_CHANNEL)
            .bind(&self.name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(queue = %self.name, filename = %filename, "Item enqueued");
        Ok(())
    }

    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        self.check_open()?;
        self.ensure_schema().await?;

        let deadline = Instant::now() + timeout;

        // One blocked consumer per queue instance; LISTEN is set up before the first claim
        // so an insert that lands in between still wakes us.
        let mut guard = self.listener.lock().await;
        if guard.is_none() {
            *guard = Some(self.listen().await?);
        }
        let Some(listener) = guard.as_mut() else {
            return Err(QueueError::Unavailable("Listener not connected".to_string()));
        };

        loop {
            self.check_open()?;

            if let Some(item) = self.try_claim().await? {
                return Ok(Some(item));
            }

            let received = tokio::time::timeout_at(deadline, listener.recv()).await;
            match received {
                Err(_) => return Ok(None),
                Ok(Ok(notification)) => {
                    tracing::trace!(payload = notification.payload(), "Queue notification received");
                }
                Ok(Err(e)) => {
                    *guard = None;
                    return Err(e.into());
                }
            }
        }
    }

    async fn length(&self) -> Result<u64, QueueError> {
        self.ensure_schema().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_queue WHERE queue_name = $1")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), QueueError> {
        self.check_open()?;
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.pool.close().await;
        tracing::info!(queue = %self.name, "Work queue closed");
    }
}
