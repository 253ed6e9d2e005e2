//! API route handlers, wired up in `app::create_app`.

pub mod admin_users;
pub mod auth;
pub mod clusters;
pub mod expirations;
pub mod graves;
pub mod health;
pub mod pictures;
pub mod relations;
pub mod requests;
pub mod search;
