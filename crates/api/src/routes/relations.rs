//! Grave relation handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::relation::{CreateRelationRequest, RelationResponse};
use persistence::repositories::{GraveRepository, RelationRepository, UserRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::routes::graves::grave_not_found;

fn relation_not_found() -> ApiError {
    ApiError::NotFound("Relation not found".into())
}

/// Relations of the calling user.
///
/// GET /api/v1/relations
pub async fn list_my_relations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<RelationResponse>>, ApiError> {
    let relations = RelationRepository::new(state.pool.clone())
        .list_by_user(auth.user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(relations))
}

/// GET /api/v1/relations/:id
pub async fn get_relation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RelationResponse>, ApiError> {
    let relation = RelationRepository::new(state.pool.clone())
        .find_detail(id)
        .await?
        .ok_or_else(relation_not_found)?;

    if relation.relation.user_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::Forbidden(
            "You do not have access to this relation".into(),
        ));
    }
    Ok(Json(relation.into()))
}

/// GET /api/v1/admin/graves/:id/relations
pub async fn list_grave_relations(
    State(state): State<AppState>,
    Path(grave_id): Path<Uuid>,
) -> Result<Json<Vec<RelationResponse>>, ApiError> {
    if GraveRepository::new(state.pool.clone())
        .find_by_id(grave_id)
        .await?
        .is_none()
    {
        return Err(grave_not_found());
    }

    let relations = RelationRepository::new(state.pool.clone())
        .list_by_grave(grave_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(relations))
}

/// POST /api/v1/admin/relations
pub async fn create_relation(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateRelationRequest>,
) -> Result<(StatusCode, Json<RelationResponse>), ApiError> {
    if UserRepository::new(state.pool.clone())
        .find_by_id(request.user_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("User not found".into()));
    }
    if GraveRepository::new(state.pool.clone())
        .find_by_id(request.grave_id)
        .await?
        .is_none()
    {
        return Err(grave_not_found());
    }

    let repo = RelationRepository::new(state.pool.clone());
    let created = repo
        .create(
            request.user_id,
            request.grave_id,
            request.relationship.as_deref().map(str::trim),
            request.request_id,
        )
        .await?
        .ok_or_else(|| ApiError::Conflict("User is already related to this grave".into()))?;

    let relation = repo
        .find_detail(created.id)
        .await?
        .ok_or_else(relation_not_found)?;
    tracing::info!(
        relation_id = %created.id,
        user_id = %created.user_id,
        grave_id = %created.grave_id,
        "Grave relation created"
    );
    Ok((StatusCode::CREATED, Json(relation.into())))
}

/// DELETE /api/v1/admin/relations/:id
pub async fn delete_relation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = RelationRepository::new(state.pool.clone()).delete(id).await?;
    if deleted == 0 {
        return Err(relation_not_found());
    }
    tracing::info!(relation_id = %id, "Grave relation deleted");
    Ok(StatusCode::NO_CONTENT)
}
