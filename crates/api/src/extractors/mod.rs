//! Custom Axum extractors.

pub mod user_auth;
pub mod validated;

pub use user_auth::AuthUser;
pub use validated::{ValidatedJson, ValidatedQuery};
