//! Offset pagination helpers.
//!
//! Page numbers are 1-based. `limit` is clamped by callers through
//! validation to `1..=MAX_PAGE_LIMIT` before reaching these helpers.

use serde::Serialize;

/// Largest page size any list endpoint accepts.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Default page size when the client does not ask for one.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Highest page number list endpoints accept.
pub const MAX_PAGE: i64 = 1_000_000;

/// Offset for a 1-based page. Saturates instead of overflowing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit.max(0))
}

/// Pagination block returned next to a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Whether more rows exist after a slice fetched with `limit`/`offset`.
///
/// A short slice always means the end was reached; a full slice only means
/// more rows when the total says so.
pub fn has_more(returned: usize, limit: i64, offset: i64, total: i64) -> bool {
    returned as i64 == limit && offset + (returned as i64) < total
}
