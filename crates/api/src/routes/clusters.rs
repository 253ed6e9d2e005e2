//! Cluster and cluster-instruction handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::cluster::{
    rank_by_distance, ClusterResponse, Coordinates, CreateClusterRequest, NearbyCluster,
    NearbyClustersQuery, UpdateClusterRequest,
};
use domain::models::grave::GraveResponse;
use domain::models::instruction::{number_steps, ClusterInstructions, UpsertInstructionsRequest};
use persistence::repositories::{
    ClusterDeletion, ClusterRepository, GraveRepository, InstructionRepository, StepRow,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ValidatedJson, ValidatedQuery};

fn cluster_not_found() -> ApiError {
    ApiError::NotFound("Cluster not found".into())
}

/// GET /api/v1/clusters
pub async fn list_clusters(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClusterResponse>>, ApiError> {
    let clusters = ClusterRepository::new(state.pool.clone())
        .list_with_counts()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(clusters))
}

/// Closest clusters to a point, nearest first.
///
/// GET /api/v1/clusters/nearby
pub async fn nearby_clusters(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<NearbyClustersQuery>,
) -> Result<Json<Vec<NearbyCluster>>, ApiError> {
    let clusters: Vec<ClusterResponse> = ClusterRepository::new(state.pool.clone())
        .list_with_counts()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let origin = Coordinates {
        latitude: query.latitude,
        longitude: query.longitude,
    };
    Ok(Json(rank_by_distance(origin, clusters, query.limit)))
}

/// GET /api/v1/clusters/:id
pub async fn get_cluster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClusterResponse>, ApiError> {
    let cluster = ClusterRepository::new(state.pool.clone())
        .find_with_count(id)
        .await?
        .ok_or_else(cluster_not_found)?;
    Ok(Json(cluster.into()))
}

/// GET /api/v1/clusters/:id/graves
pub async fn list_cluster_graves(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GraveResponse>>, ApiError> {
    if ClusterRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .is_none()
    {
        return Err(cluster_not_found());
    }

    let graves = GraveRepository::new(state.pool.clone())
        .list(Some(id))
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(graves))
}

/// GET /api/v1/clusters/:id/instructions
pub async fn get_instructions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClusterInstructions>, ApiError> {
    InstructionRepository::new(state.pool.clone())
        .find_by_cluster(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No instructions for this cluster".into()))
}

/// POST /api/v1/admin/clusters
pub async fn create_cluster(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateClusterRequest>,
) -> Result<(StatusCode, Json<ClusterResponse>), ApiError> {
    let cluster = ClusterRepository::new(state.pool.clone())
        .create(
            request.name.trim(),
            request.cluster_number,
            request.coordinates.latitude,
            request.coordinates.longitude,
            request.description.as_deref(),
        )
        .await
        .map_err(|e| duplicate_number(e, request.cluster_number))?;

    tracing::info!(
        cluster_id = %cluster.id,
        cluster_number = cluster.cluster_number,
        "Cluster created"
    );
    Ok((
        StatusCode::CREATED,
        Json(ClusterResponse::new(cluster.into(), 0)),
    ))
}

/// PATCH /api/v1/admin/clusters/:id
pub async fn update_cluster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateClusterRequest>,
) -> Result<Json<ClusterResponse>, ApiError> {
    let repo = ClusterRepository::new(state.pool.clone());
    repo.update(
        id,
        request.name.as_deref().map(str::trim),
        request.cluster_number,
        request.coordinates.map(|c| c.latitude),
        request.coordinates.map(|c| c.longitude),
        request.description.as_deref(),
    )
    .await
    .map_err(|e| duplicate_number(e, request.cluster_number))?
    .ok_or_else(cluster_not_found)?;

    let cluster = repo.find_with_count(id).await?.ok_or_else(cluster_not_found)?;
    tracing::info!(cluster_id = %id, "Cluster updated");
    Ok(Json(cluster.into()))
}

/// Refuses while graves still belong to the cluster.
///
/// DELETE /api/v1/admin/clusters/:id
pub async fn delete_cluster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match ClusterRepository::new(state.pool.clone()).delete(id).await? {
        ClusterDeletion::Deleted => {
            tracing::info!(cluster_id = %id, "Cluster deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        ClusterDeletion::NotFound => Err(cluster_not_found()),
        ClusterDeletion::HasGraves(count) => Err(ApiError::Conflict(format!(
            "Cluster still has {} grave(s); move or delete them first",
            count
        ))),
    }
}

/// Replaces the instructions; steps are renumbered 1..n in the given order.
///
/// PUT /api/v1/admin/clusters/:id/instructions
pub async fn upsert_instructions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpsertInstructionsRequest>,
) -> Result<Json<ClusterInstructions>, ApiError> {
    if ClusterRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .is_none()
    {
        return Err(cluster_not_found());
    }

    let rows: Vec<StepRow<'_>> = number_steps(&request.steps)
        .into_iter()
        .map(|(step_number, step)| StepRow {
            step_number,
            description: step.description.trim(),
            image_url: step.image_url.as_deref(),
        })
        .collect();

    let instructions = InstructionRepository::new(state.pool.clone())
        .upsert(id, request.title.trim(), &rows)
        .await?;
    tracing::info!(cluster_id = %id, steps = rows.len(), "Cluster instructions saved");
    Ok(Json(instructions))
}

/// DELETE /api/v1/admin/clusters/:id/instructions
pub async fn delete_instructions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = InstructionRepository::new(state.pool.clone())
        .delete_by_cluster(id)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("No instructions for this cluster".into()));
    }
    tracing::info!(cluster_id = %id, "Cluster instructions deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn duplicate_number(err: sqlx::Error, number: Option<i32>) -> ApiError {
    match (&err, number) {
        (sqlx::Error::Database(db), Some(n)) if db.code().as_deref() == Some("23505") => {
            ApiError::Conflict(format!("Cluster number {} is already in use", n))
        }
        _ => err.into(),
    }
}
