//! Admin user management handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use domain::models::user::{BanUserRequest, UpdateRoleRequest, User, UserResponse};
use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

fn respond(user: persistence::entities::UserEntity) -> Json<UserResponse> {
    Json(User::from(user).into())
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = UserRepository::new(state.pool.clone())
        .list_all()
        .await?
        .into_iter()
        .map(|u| User::from(u).into())
        .collect();
    Ok(Json(users))
}

/// PUT /api/v1/admin/users/:id/ban
pub async fn ban_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<BanUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if id == auth.user_id {
        return Err(ApiError::Validation("You cannot ban yourself".into()));
    }

    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let user = UserRepository::new(state.pool.clone())
        .set_banned(id, true, reason)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %id, admin_id = %auth.user_id, "User banned");
    Ok(respond(user))
}

/// DELETE /api/v1/admin/users/:id/ban
pub async fn unban_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .set_banned(id, false, None)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %id, admin_id = %auth.user_id, "User unbanned");
    Ok(respond(user))
}

/// PUT /api/v1/admin/users/:id/role
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if id == auth.user_id && !request.role.is_admin() {
        return Err(ApiError::Validation(
            "You cannot remove your own admin role".into(),
        ));
    }

    let user = UserRepository::new(state.pool.clone())
        .set_role(id, request.role.as_str())
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %id, admin_id = %auth.user_id, role = %request.role, "User role changed");
    Ok(respond(user))
}
