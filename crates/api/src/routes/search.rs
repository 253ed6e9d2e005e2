//! Keyword search handlers.

use axum::{extract::State, Json};
use chrono::Utc;

use domain::models::search::{
    like_pattern, GlobalSearchResponse, GraveSearchResponse, SearchQuery,
};
use persistence::repositories::SearchRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedQuery};

async fn search_graves_page(
    repo: &SearchRepository,
    pattern: &str,
    query: &SearchQuery,
) -> Result<GraveSearchResponse, ApiError> {
    let (rows, total) = repo
        .search_graves(pattern, query.limit, query.offset)
        .await?;
    Ok(GraveSearchResponse::new(
        rows.into_iter().map(Into::into).collect(),
        total,
        query.limit,
        query.offset,
    ))
}

/// Case-insensitive search over deceased name, plot number, grave type and
/// notes.
///
/// GET /api/v1/search/graves
pub async fn search_graves(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<GraveSearchResponse>, ApiError> {
    let repo = SearchRepository::new(state.pool.clone());
    let pattern = like_pattern(&query.q);
    Ok(Json(search_graves_page(&repo, &pattern, &query).await?))
}

/// Graves plus requests. Non-admins only see their own requests.
///
/// GET /api/v1/search
pub async fn global_search(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<GlobalSearchResponse>, ApiError> {
    let repo = SearchRepository::new(state.pool.clone());
    let pattern = like_pattern(&query.q);

    let graves = search_graves_page(&repo, &pattern, &query).await?;

    let owner = (!auth.is_admin()).then_some(auth.user_id);
    let now = Utc::now();
    let requests = repo
        .search_requests(&pattern, owner, query.limit)
        .await?
        .into_iter()
        .map(|r| r.into_response(now))
        .collect();

    Ok(Json(GlobalSearchResponse { graves, requests }))
}
