//! Keyword search over graves and requests.

use serde::{Deserialize, Serialize};
use shared::pagination::has_more;
use validator::Validate;

use super::grave::GraveResponse;
use super::request::RequestResponse;

/// Search query parameters.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[validate(
        length(min = 1, max = 200, message = "Query must be 1-200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub q: String,

    #[serde(default = "default_search_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Offset must not be negative"))]
    pub offset: i64,
}

fn default_search_limit() -> i64 {
    20
}

/// One page of grave search results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraveSearchResponse {
    pub results: Vec<GraveResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl GraveSearchResponse {
    pub fn new(results: Vec<GraveResponse>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            has_more: has_more(results.len(), limit, offset, total),
            results,
            total,
            limit,
            offset,
        }
    }
}

/// Combined search for signed-in users.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSearchResponse {
    pub graves: GraveSearchResponse,
    pub requests: Vec<RequestResponse>,
}

/// Builds a case-insensitive `ILIKE` pattern that matches `q` literally
/// anywhere in the text.
pub fn like_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
