//! Shared utilities for the grave registry backend.
//!
//! - Content hashing for stored pictures
//! - JWT access tokens
//! - Password hashing with Argon2id
//! - Offset pagination math
//! - Common validation rules

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
