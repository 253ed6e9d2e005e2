//! Bearer-token authentication and role gating.
//!
//! The token only proves identity. Role and ban state are loaded from the
//! users table on every request so that bans and demotions apply at once.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::user::{User, UserRole};
use persistence::repositories::UserRepository;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    pub role: UserRole,
    pub display_name: String,
}

impl UserAuth {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the caller from the request's bearer token.
pub async fn authenticate(state: &AppState, headers: &axum::http::HeaderMap) -> Result<UserAuth, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Missing or invalid Authorization header".into()))?;

    let claims = state.jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;
    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    let user: User = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".into()))?
        .into();

    if user.is_banned {
        return Err(ApiError::Forbidden(match user.ban_reason {
            Some(reason) => format!("Account is banned: {}", reason),
            None => "Account is banned".into(),
        }));
    }

    Ok(UserAuth {
        user_id: user.id,
        role: user.role,
        display_name: user.display_name,
    })
}

/// Rejects requests without a valid token for an existing, non-banned user.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects non-admin callers. Layer it inside `require_user_auth`.
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<UserAuth>() {
        Some(auth) if auth.is_admin() => next.run(req).await,
        Some(auth) => {
            tracing::info!(user_id = %auth.user_id, path = %req.uri().path(), "Admin access denied");
            ApiError::Forbidden("Admin access required".into()).into_response()
        }
        None => ApiError::Unauthorized("Authentication required".into()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("bearer abc"), None);
    }

    #[test]
    fn test_user_auth_is_admin() {
        let auth = UserAuth {
            user_id: Uuid::new_v4(),
            role: UserRole::Admin,
            display_name: "Admin".into(),
        };
        assert!(auth.is_admin());
    }
}
