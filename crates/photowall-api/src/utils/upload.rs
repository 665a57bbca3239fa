//! Upload body helpers: multipart streaming and base64 JSON content.

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use base64::{engine::general_purpose, Engine as _};
use futures::TryStreamExt;
use photowall_core::AppError;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Stream a multipart field without buffering it in memory.
pub fn field_reader(field: Field<'_>) -> impl AsyncRead + Send + '_ {
    StreamReader::new(field.map_err(io::Error::other))
}

/// Map a failure of the client's body stream to the matching client error.
pub fn upload_stream_error(err: io::Error) -> AppError {
    let kind = err.kind();
    match err
        .into_inner()
        .map(|inner| inner.downcast::<MultipartError>())
    {
        Some(Ok(multipart)) => multipart_error(*multipart),
        Some(Err(inner)) => AppError::Validation(format!("Failed to read upload: {}", inner)),
        None => AppError::Validation(format!("Failed to read upload: {}", kind)),
    }
}

pub fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge("Upload exceeds the maximum body size".to_string());
    }
    AppError::Validation(format!("Failed to read multipart: {}", err.body_text()))
}

/// Decode `image_content` from a JSON upload.
///
/// Accepts plain base64 or a `data:<mime>;base64,` URL. Returns the bytes and, for data
/// URLs, the declared MIME type.
pub fn decode_image_content(content: &str) -> Result<(Vec<u8>, Option<String>), AppError> {
    let content = content.trim();

    let (declared_type, payload) = match content.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| AppError::Validation("Malformed data URL".to_string()))?;
            let mime = meta.strip_suffix(";base64").ok_or_else(|| {
                AppError::Validation("Only base64 data URLs are supported".to_string())
            })?;
            (Some(mime.to_string()), data)
        }
        None => (None, content),
    };

    let bytes = general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("Invalid base64 image content: {}", e)))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("Image content is empty".to_string()));
    }

    Ok((bytes, declared_type))
}
