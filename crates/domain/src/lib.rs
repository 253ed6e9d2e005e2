//! Domain layer for the grave registry backend.
//!
//! Holds the models and request/response types for clusters, graves,
//! pictures, instructions, relations and service requests, plus the pure
//! rules around them (overdue classification, details parsing, expiration
//! windows, search paging).

pub mod models;
