//! HTTP error body
//!
//! The `IntoResponse` conversion for `AppError` lives in photowall-api: neither the trait
//! nor the type is local to this crate.

use serde::{Deserialize, Serialize};

/// Error body returned by every endpoint. `message` is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}
