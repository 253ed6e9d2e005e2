//! Keyword search queries.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GraveWithClusterEntity, RequestDetailEntity};
use crate::metrics::QueryTimer;
use crate::repositories::grave::GRAVE_WITH_CLUSTER_SELECT;
use crate::repositories::request::REQUEST_DETAIL_SELECT;

const GRAVE_MATCH: &str = r#"
    (g.details->>'deceasedName' ILIKE $1
     OR g.details->>'plotNumber' ILIKE $1
     OR g.details->>'graveType' ILIKE $1
     OR g.details->>'notes' ILIKE $1)
"#;

/// Repository for search across graves and requests.
///
/// Patterns are `ILIKE` patterns, already escaped by the caller.
#[derive(Clone)]
pub struct SearchRepository {
    pool: PgPool,
}

impl SearchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of matching graves ordered by deceased name, plus the total
    /// number of matches.
    pub async fn search_graves(
        &self,
        pattern: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<GraveWithClusterEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("search_graves");

        let rows = sqlx::query_as::<_, GraveWithClusterEntity>(&format!(
            r#"
            {GRAVE_WITH_CLUSTER_SELECT}
            WHERE {GRAVE_MATCH}
            ORDER BY g.details->>'deceasedName' NULLS LAST, g.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM grave_details g WHERE {GRAVE_MATCH}"
        ))
        .bind(pattern)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok((rows, total.0))
    }

    /// Requests whose details text matches, newest first. `owner` restricts
    /// the search to one user's requests.
    pub async fn search_requests(
        &self,
        pattern: &str,
        owner: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<RequestDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_requests");
        let result = sqlx::query_as::<_, RequestDetailEntity>(&format!(
            r#"
            {REQUEST_DETAIL_SELECT}
            WHERE r.details ILIKE $1 AND ($2::uuid IS NULL OR r.user_id = $2)
            ORDER BY r.created_at DESC
            LIMIT $3
            "#
        ))
        .bind(pattern)
        .bind(owner)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
