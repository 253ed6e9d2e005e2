//! Grave picture handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::picture::{GravePicture, UploadPictureRequest};
use persistence::repositories::{GraveRepository, NewPicture, PictureRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::middleware::metrics::record_picture_uploaded;
use crate::routes::graves::{grave_not_found, remove_unreferenced_file};
use crate::services::{decode_upload, UploadError};

/// GET /api/v1/graves/:id/pictures
pub async fn list_pictures(
    State(state): State<AppState>,
    Path(grave_id): Path<Uuid>,
) -> Result<Json<Vec<GravePicture>>, ApiError> {
    if GraveRepository::new(state.pool.clone())
        .find_by_id(grave_id)
        .await?
        .is_none()
    {
        return Err(grave_not_found());
    }

    let pictures = PictureRepository::new(state.pool.clone())
        .list_by_grave(grave_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(pictures))
}

/// POST /api/v1/admin/graves/:id/pictures
pub async fn upload_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(grave_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UploadPictureRequest>,
) -> Result<(StatusCode, Json<GravePicture>), ApiError> {
    if GraveRepository::new(state.pool.clone())
        .find_by_id(grave_id)
        .await?
        .is_none()
    {
        return Err(grave_not_found());
    }

    let decoded = decode_upload(&request, state.config.limits.max_upload_bytes).map_err(
        |e| match e {
            UploadError::TooLarge(_) => ApiError::PayloadTooLarge(e.to_string()),
            other => ApiError::Validation(other.to_string()),
        },
    )?;

    state
        .storage
        .put(&decoded.storage_key, &decoded.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store picture: {}", e)))?;

    let url = state.storage.public_url(&decoded.storage_key);
    let picture = PictureRepository::new(state.pool.clone())
        .create(NewPicture {
            grave_id,
            url: &url,
            storage_key: &decoded.storage_key,
            content_type: &decoded.content_type,
            size_bytes: decoded.bytes.len() as i64,
            caption: request.caption.as_deref(),
            uploaded_by: Some(auth.user_id),
        })
        .await?;

    record_picture_uploaded(decoded.bytes.len());
    tracing::info!(
        picture_id = %picture.id,
        grave_id = %grave_id,
        size_bytes = decoded.bytes.len(),
        "Picture uploaded"
    );
    Ok((StatusCode::CREATED, Json(picture.into())))
}

/// Deletes the row, then the file if nothing else references it.
///
/// DELETE /api/v1/admin/pictures/:id
pub async fn delete_picture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pictures = PictureRepository::new(state.pool.clone());
    let deleted = pictures
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Picture not found".into()))?;

    remove_unreferenced_file(&pictures, state.storage.as_ref(), &deleted.storage_key).await;
    tracing::info!(picture_id = %id, grave_id = %deleted.grave_id, "Picture deleted");
    Ok(StatusCode::NO_CONTENT)
}
