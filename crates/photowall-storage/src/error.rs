//! Storage operation errors

use photowall_core::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// The input stream failed while staging. The store itself is fine.
    #[error("Failed to read upload stream: {0}")]
    SourceFailed(#[source] std::io::Error),

    #[error("Invalid filename: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::Validation(format!("Invalid filename: {}", msg)),
            StorageError::SourceFailed(e) => {
                AppError::Validation(format!("Failed to read upload: {}", e))
            }
            StorageError::AlreadyExists(msg) => {
                AppError::Io(format!("File already exists: {}", msg))
            }
            StorageError::WriteFailed(msg)
            | StorageError::ReadFailed(msg)
            | StorageError::DeleteFailed(msg) => AppError::Io(msg),
            StorageError::IoError(e) => AppError::from(e),
        }
    }
}
