//! Error types module
//!
//! All failures that reach a caller are unified under `AppError`. The variants follow the
//! ingestion taxonomy: user-correctable validation failures, filesystem failures, missing
//! files and a degraded queue. `ErrorMetadata` lets each error describe how it is presented.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for degraded but recoverable situations
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad, undecodable or unsupported input.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Filesystem failure. Not retried.
    #[error("IO error: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The work queue could not be reached. Callers on the upload path log this and continue.
    #[error("Queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            AppError::NotFound(err.to_string())
        } else {
            AppError::Io(err.to_string())
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::Validation(_) => (400, "VALIDATION_ERROR", false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::Io(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::QueueUnavailable(_) => (503, "QUEUE_UNAVAILABLE", true, LogLevel::Warn),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Io(_) => "Io",
            AppError::NotFound(_) => "NotFound",
            AppError::QueueUnavailable(_) => "QueueUnavailable",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Io(_) => "Failed to access photo storage".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::QueueUnavailable(_) => "Processing queue unavailable".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
