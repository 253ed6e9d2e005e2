//! Service request handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use domain::models::request::{
    overdue_cutoff, submission_log_message, AppendLogRequest, CreateServiceRequest,
    ListRequestsQuery, PaginatedRequests, RequestLog, RequestResponse, RequestStats,
    RequestStatus, UpdateStatusRequest,
};
use persistence::repositories::{GraveRepository, RequestRepository};
use shared::pagination::{page_offset, PaginationMeta};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson, ValidatedQuery};
use crate::middleware::metrics::{record_request_created, record_status_change};
use crate::routes::graves::grave_not_found;

fn request_not_found() -> ApiError {
    ApiError::NotFound("Request not found".into())
}

/// Loads a request with its logs, newest log first.
async fn load_with_logs(repo: &RequestRepository, id: Uuid) -> Result<RequestResponse, ApiError> {
    let detail = repo.find_detail(id).await?.ok_or_else(request_not_found)?;
    let logs: Vec<RequestLog> = repo
        .list_logs(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let mut response = detail.into_response(Utc::now());
    response.logs = Some(logs);
    Ok(response)
}

/// Requests submitted by the caller, newest first.
///
/// GET /api/v1/requests
pub async fn list_my_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let now = Utc::now();
    let requests = RequestRepository::new(state.pool.clone())
        .list_by_user(auth.user_id)
        .await?
        .into_iter()
        .map(|r| r.into_response(now))
        .collect();
    Ok(Json(requests))
}

/// Submits a request. It starts `pending` with one submission log entry.
///
/// POST /api/v1/requests
pub async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<RequestResponse>), ApiError> {
    if let Some(grave_id) = request.grave_id {
        if GraveRepository::new(state.pool.clone())
            .find_by_id(grave_id)
            .await?
            .is_none()
        {
            return Err(grave_not_found());
        }
    }

    let details = request.to_details();
    let repo = RequestRepository::new(state.pool.clone());
    let created = repo
        .create(
            auth.user_id,
            request.grave_id,
            &details.serialize(),
            &submission_log_message(details.priority),
        )
        .await?;

    record_request_created();
    tracing::info!(
        request_id = %created.id,
        user_id = %auth.user_id,
        priority = details.priority.as_str(),
        "Service request submitted"
    );

    let response = load_with_logs(&repo, created.id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Owner or admin only.
///
/// GET /api/v1/requests/:id
pub async fn get_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestResponse>, ApiError> {
    let repo = RequestRepository::new(state.pool.clone());
    let owner = repo
        .find_by_id(id)
        .await?
        .ok_or_else(request_not_found)?
        .user_id;

    if owner != auth.user_id && !auth.is_admin() {
        return Err(ApiError::Forbidden(
            "You do not have access to this request".into(),
        ));
    }

    Ok(Json(load_with_logs(&repo, id).await?))
}

/// GET /api/v1/admin/requests
pub async fn list_all_requests(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListRequestsQuery>,
) -> Result<Json<PaginatedRequests>, ApiError> {
    let (rows, total) = RequestRepository::new(state.pool.clone())
        .list_paginated(
            query.status,
            query.limit,
            page_offset(query.page, query.limit),
        )
        .await?;

    let now = Utc::now();
    Ok(Json(PaginatedRequests {
        data: rows.into_iter().map(|r| r.into_response(now)).collect(),
        pagination: PaginationMeta::new(query.page, query.limit, total),
    }))
}

/// GET /api/v1/admin/requests/stats
pub async fn request_stats(
    State(state): State<AppState>,
) -> Result<Json<RequestStats>, ApiError> {
    let counts = RequestRepository::new(state.pool.clone())
        .status_counts(overdue_cutoff(Utc::now()))
        .await?;
    let rows = counts.into_iter().map(|(status, count, overdue)| {
        (
            status.parse().unwrap_or(RequestStatus::Pending),
            count,
            overdue,
        )
    });
    Ok(Json(RequestStats::from_counts(rows)))
}

/// Sets the status. Any status may follow any other; every call appends a
/// log entry, even when the status is unchanged.
///
/// PUT /api/v1/admin/requests/:id/status
pub async fn update_request_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<RequestResponse>, ApiError> {
    let remark = request
        .remark
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let repo = RequestRepository::new(state.pool.clone());
    let change = repo
        .update_status(id, request.status, remark, auth.user_id)
        .await?
        .ok_or_else(request_not_found)?;

    record_status_change(change.current);
    tracing::info!(
        request_id = %id,
        admin_id = %auth.user_id,
        previous = change.previous.map(|s| s.as_str()).unwrap_or("none"),
        current = change.current.as_str(),
        "Request status updated"
    );

    Ok(Json(load_with_logs(&repo, id).await?))
}

/// POST /api/v1/admin/requests/:id/logs
pub async fn append_request_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AppendLogRequest>,
) -> Result<(StatusCode, Json<RequestLog>), ApiError> {
    let log = RequestRepository::new(state.pool.clone())
        .append_log(id, auth.user_id, request.message.trim())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
                request_not_found()
            }
            _ => e.into(),
        })?;

    tracing::info!(request_id = %id, log_id = %log.id, "Request log appended");
    Ok((StatusCode::CREATED, Json(log.into())))
}

/// Removes the request with its status, logs and the relations granted
/// for it.
///
/// DELETE /api/v1/admin/requests/:id
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !RequestRepository::new(state.pool.clone()).delete(id).await? {
        return Err(request_not_found());
    }
    tracing::info!(request_id = %id, "Request deleted");
    Ok(StatusCode::NO_CONTENT)
}
