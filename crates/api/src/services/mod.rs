//! Application services.

pub mod admin_bootstrap;
pub mod auth;
pub mod storage;

pub use admin_bootstrap::{bootstrap_admin, BootstrapOutcome};
pub use auth::{build_jwt_config, AuthService};
pub use storage::{decode_upload, LocalStorage, PictureStorage, StorageError, UploadError};
