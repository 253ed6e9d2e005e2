//! Account registration and login.

use shared::jwt::{JwtConfig, JwtError};
use shared::password::{hash_password, validate_password_strength, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

use domain::models::user::{AuthResponse, TokenResponse, User, UserResponse, UserRole};
use persistence::repositories::UserRepository;

use crate::config::JwtAuthConfig;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is banned")]
    Banned(Option<String>),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::WeakPassword(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::Banned(Some(reason)) => {
                ApiError::Forbidden(format!("Account is banned: {}", reason))
            }
            AuthError::Banned(None) => ApiError::Forbidden(err.to_string()),
            AuthError::Database(e) => e.into(),
            AuthError::Token(_) | AuthError::Password(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Builds the signing config from PEM keys that may have been passed
/// through environment variables with escaped newlines or quotes.
pub fn build_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, JwtError> {
    JwtConfig::with_leeway(
        &normalize_pem_key(&config.private_key),
        &normalize_pem_key(&config.public_key),
        config.access_token_expiry_secs,
        config.leeway_secs,
    )
}

fn normalize_pem_key(key: &str) -> String {
    key.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .replace("\\n", "\n")
}

/// Registers accounts and issues access tokens.
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Creates a regular user account and signs it in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthResponse, AuthError> {
        validate_password_strength(password).map_err(AuthError::WeakPassword)?;

        let email = email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let user = match self
            .users
            .create(
                &email,
                &password_hash,
                display_name.trim(),
                UserRole::User.as_str(),
            )
            .await
        {
            Ok(user) => User::from(user),
            // Lost a race with a concurrent registration.
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                return Err(AuthError::EmailAlreadyExists)
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %user.id, "User registered");
        self.issue(user)
    }

    /// Verifies credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user: User = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if user.is_banned {
            return Err(AuthError::Banned(user.ban_reason));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    fn issue(&self, user: User) -> Result<AuthResponse, AuthError> {
        let (access_token, _jti) = self.jwt.generate_access_token(user.id)?;
        Ok(AuthResponse {
            user: UserResponse::from(user),
            tokens: TokenResponse {
                access_token,
                token_type: "Bearer".to_string(),
                expires_in: self.jwt.access_token_expiry_secs,
            },
        })
    }
}
