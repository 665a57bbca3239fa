//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors convert into
//! `AppError` first, so every failure renders the same `{message, code}` body and is
//! logged at the level its metadata asks for.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use photowall_core::{AppError, ErrorMetadata, LogLevel};
use photowall_infra::ErrorResponse;
use photowall_storage::StorageError;
use photowall_worker::QueueError;
use serde::de::DeserializeOwned;

/// Wrapper type for AppError to implement IntoResponse
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<QueueError> for HttpAppError {
    fn from(err: QueueError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        let app = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Request body is too large".to_string())
        } else {
            AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
        };
        HttpAppError(app)
    }
}

/// JSON body extractor that answers 400 with our error body on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                error_type = error_type,
                details = %error.detailed_message(),
                "Request failed"
            );
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse::new(app_error.client_message()).with_code(app_error.error_code());

        (status, Json(body)).into_response()
    }
}
