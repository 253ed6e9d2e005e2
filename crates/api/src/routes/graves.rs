//! Grave handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::grave::{
    CreateGraveRequest, GraveAttributes, GraveResponse, ListGravesQuery, UpdateGraveRequest,
};
use persistence::repositories::{GraveRepository, PictureRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::services::PictureStorage;

pub(crate) fn grave_not_found() -> ApiError {
    ApiError::NotFound("Grave not found".into())
}

/// GET /api/v1/graves
pub async fn list_graves(
    State(state): State<AppState>,
    Query(query): Query<ListGravesQuery>,
) -> Result<Json<Vec<GraveResponse>>, ApiError> {
    let graves = GraveRepository::new(state.pool.clone())
        .list(query.cluster_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(graves))
}

/// GET /api/v1/graves/:id
pub async fn get_grave(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GraveResponse>, ApiError> {
    let grave = GraveRepository::new(state.pool.clone())
        .find_with_cluster(id)
        .await?
        .ok_or_else(grave_not_found)?;
    Ok(Json(grave.into()))
}

/// POST /api/v1/admin/graves
pub async fn create_grave(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateGraveRequest>,
) -> Result<(StatusCode, Json<GraveResponse>), ApiError> {
    let repo = GraveRepository::new(state.pool.clone());
    let created = repo
        .create(
            request.cluster_id,
            request.details.to_json(),
            request.expiration_date,
        )
        .await
        .map_err(unknown_cluster)?;

    let grave = repo
        .find_with_cluster(created.id)
        .await?
        .ok_or_else(grave_not_found)?;
    tracing::info!(grave_id = %created.id, cluster_id = %created.cluster_id, "Grave created");
    Ok((StatusCode::CREATED, Json(grave.into())))
}

/// Partial update. Keys in `details` are merged into the stored document.
///
/// PATCH /api/v1/admin/graves/:id
pub async fn update_grave(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateGraveRequest>,
) -> Result<Json<GraveResponse>, ApiError> {
    let repo = GraveRepository::new(state.pool.clone());
    let current = repo.find_by_id(id).await?.ok_or_else(grave_not_found)?;

    let details = request.details.map(|patch| {
        let mut merged = GraveAttributes::from_json(current.details);
        merged.merge(patch);
        merged.to_json()
    });

    repo.update(
        id,
        request.cluster_id,
        details,
        request.expiration_date,
        request.clear_expiration,
    )
    .await
    .map_err(unknown_cluster)?
    .ok_or_else(grave_not_found)?;

    let grave = repo.find_with_cluster(id).await?.ok_or_else(grave_not_found)?;
    tracing::info!(grave_id = %id, "Grave updated");
    Ok(Json(grave.into()))
}

/// Deletes the grave and its pictures. Picture files are removed
/// best-effort after the rows are gone.
///
/// DELETE /api/v1/admin/graves/:id
pub async fn delete_grave(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let keys = GraveRepository::new(state.pool.clone())
        .delete(id)
        .await?
        .ok_or_else(grave_not_found)?;

    let pictures = PictureRepository::new(state.pool.clone());
    for key in &keys {
        remove_unreferenced_file(&pictures, state.storage.as_ref(), key).await;
    }

    tracing::info!(grave_id = %id, pictures = keys.len(), "Grave deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Removes a stored file unless another picture row still points at it.
/// Failures are logged and swallowed.
pub(crate) async fn remove_unreferenced_file(
    pictures: &PictureRepository,
    storage: &dyn PictureStorage,
    key: &str,
) {
    match pictures.is_key_referenced(key).await {
        Ok(true) => return,
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(storage_key = %key, error = %e, "Could not check picture references; keeping file");
            return;
        }
    }
    if let Err(e) = storage.remove(key).await {
        tracing::warn!(storage_key = %key, error = %e, "Failed to remove picture file");
    }
}

fn unknown_cluster(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
            ApiError::NotFound("Cluster not found".into())
        }
        _ => err.into(),
    }
}
