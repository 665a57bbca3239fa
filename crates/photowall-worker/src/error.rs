use photowall_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Queue is closed")]
    Closed,
}

impl From<sqlx::Error> for QueueError {
    fn from(err: sqlx::Error) -> Self {
        QueueError::Unavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for QueueError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        QueueError::Unavailable(format!("Failed to prepare queue schema: {}", err))
    }
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        AppError::QueueUnavailable(err.to_string())
    }
}
