//! Registration, login and the current-user endpoint.

use axum::{extract::State, http::StatusCode, Json};

use domain::models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse};
use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::services::AuthService;

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = AuthService::new(state.pool.clone(), state.jwt.clone())
        .register(&request.email, &request.password, &request.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = AuthService::new(state.pool.clone(), state.jwt.clone())
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user: User = UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?
        .into();
    Ok(Json(user.into()))
}
