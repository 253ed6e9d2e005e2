//! Authenticated-caller extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::{authenticate, UserAuth};

/// The authenticated caller.
///
/// Inside a route group guarded by `require_user_auth` this reads the
/// identity the middleware already resolved. Elsewhere it authenticates the
/// bearer token itself.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserAuth);

impl std::ops::Deref for AuthUser {
    type Target = UserAuth;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(AuthUser(auth.clone()));
        }

        let auth = authenticate(state, &parts.headers).await?;
        parts.extensions.insert(auth.clone());
        Ok(AuthUser(auth))
    }
}
