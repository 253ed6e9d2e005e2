//! Persistence layer for the grave registry backend.
//!
//! This crate contains:
//! - Database connection management
//! - SQL migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
