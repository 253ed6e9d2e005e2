//! Creates or promotes the first admin account at startup.

use shared::password::{hash_password, validate_password_strength, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use domain::models::user::UserRole;
use persistence::repositories::UserRepository;

use crate::config::AdminBootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// What `bootstrap_admin` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NotConfigured,
    Created,
    Promoted,
    AlreadyAdmin,
}

/// Ensures the configured bootstrap account exists and is an admin.
///
/// Idempotent. An existing account with the bootstrap email is promoted and
/// keeps its password.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    let email = config.bootstrap_email.trim().to_lowercase();
    if email.is_empty() {
        return Ok(BootstrapOutcome::NotConfigured);
    }

    let users = UserRepository::new(pool.clone());

    if let Some(existing) = users.find_by_email(&email).await? {
        if existing.role == UserRole::Admin.as_str() {
            info!(user_id = %existing.id, "Bootstrap admin already present");
            return Ok(BootstrapOutcome::AlreadyAdmin);
        }
        users.set_role(existing.id, UserRole::Admin.as_str()).await?;
        info!(user_id = %existing.id, "Existing account promoted to admin");
        return Ok(BootstrapOutcome::Promoted);
    }

    if config.bootstrap_password.is_empty() {
        warn!("GR__ADMIN__BOOTSTRAP_EMAIL is set without a password; skipping admin bootstrap");
        return Ok(BootstrapOutcome::NotConfigured);
    }
    validate_password_strength(&config.bootstrap_password).map_err(BootstrapError::Config)?;

    let password_hash = hash_password(&config.bootstrap_password)?;
    let user = users
        .create(
            &email,
            &password_hash,
            &config.bootstrap_display_name,
            UserRole::Admin.as_str(),
        )
        .await?;

    info!(user_id = %user.id, email = %email, "Bootstrap admin created");
    warn!("Remove GR__ADMIN__BOOTSTRAP_PASSWORD from the environment after the first start");
    Ok(BootstrapOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_bootstrap_is_noop() {
        // No query runs when the email is unset, so a lazy pool never connects.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let outcome = bootstrap_admin(&pool, &AdminBootstrapConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, BootstrapOutcome::NotConfigured);
    }
}
