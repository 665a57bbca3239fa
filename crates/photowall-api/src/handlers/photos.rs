//! Photo upload, listing and deletion handlers.

use crate::error::{HttpAppError, ValidatedJson};
use crate::services::{CatalogPage, StoredUpload};
use crate::state::AppState;
use crate::utils::pagination::ListQuery;
use crate::utils::upload::{decode_image_content, field_reader, multipart_error, FILE_FIELD};
use axum::{
    extract::{rejection::QueryRejection, FromRequest, Multipart, Path, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use photowall_core::{AppError, Photo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_IMAGE_NAME: &str = "upload";

#[derive(Debug, Deserialize)]
pub struct UploadPhotoRequest {
    /// Base64 image bytes, optionally as a `data:` URL.
    pub image_content: String,
    #[serde(default)]
    pub image_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadPhotoResponse {
    pub photo: Photo,
}

/// Upload one photo, as multipart (`file` field) or JSON with base64 content.
///
/// Responds 200 with the stored photo. Derivation problems never fail the request.
#[tracing::instrument(skip(state, request), fields(operation = "upload_photo"))]
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<UploadPhotoResponse>, HttpAppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let stored = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| {
                AppError::Validation(format!(
                    "Invalid multipart request: {}",
                    rejection.body_text()
                ))
            })?;
        ingest_multipart(&state, multipart).await?
    } else {
        let ValidatedJson(body) =
            ValidatedJson::<UploadPhotoRequest>::from_request(request, &state).await?;
        ingest_json(&state, body).await?
    };

    let photo = state.catalog.photo(&stored.filename).await;
    Ok(Json(UploadPhotoResponse { photo }))
}

async fn ingest_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<StoredUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .unwrap_or(DEFAULT_IMAGE_NAME)
            .to_string();
        let declared_type = field.content_type().map(str::to_string);

        let reader = Box::pin(field_reader(field));
        return state
            .ingest
            .ingest(reader, &original_name, declared_type.as_deref())
            .await;
    }

    Err(AppError::Validation(format!(
        "No file provided. Send the image in a multipart field named '{}'",
        FILE_FIELD
    )))
}

async fn ingest_json(
    state: &AppState,
    body: UploadPhotoRequest,
) -> Result<StoredUpload, AppError> {
    let (bytes, declared_type) = decode_image_content(&body.image_content)?;
    let original_name = body
        .image_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_IMAGE_NAME);

    state
        .ingest
        .ingest(&bytes[..], original_name, declared_type.as_deref())
        .await
}

/// List photos newest first. Bad paging parameters fall back to defaults.
pub async fn list_photos(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<CatalogPage>, HttpAppError> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Ignoring malformed listing query");
            ListQuery::default()
        }
    };
    let (page, per_page) = query.resolve();

    let page = state.catalog.list_page(page, per_page).await?;
    Ok(Json(page))
}

/// Delete an original. Derived assets are left in place.
pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    Path(image_name): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    state.store.delete(&image_name).await?;
    Ok(StatusCode::NO_CONTENT)
}
