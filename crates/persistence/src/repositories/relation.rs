//! Grave relation repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{RelationDetailEntity, RelationEntity};
use crate::metrics::QueryTimer;

const RELATION_DETAIL_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.grave_id, r.relationship, r.request_id, r.created_at,
           u.display_name AS user_display_name,
           c.id AS cluster_id, c.name AS cluster_name,
           g.details AS grave_details
    FROM grave_related_users r
    JOIN users u ON u.id = r.user_id
    JOIN grave_details g ON g.id = r.grave_id
    JOIN grave_clusters c ON c.id = g.cluster_id
"#;

/// Repository for user/grave relations.
#[derive(Clone)]
pub struct RelationRepository {
    pool: PgPool,
}

impl RelationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Relates a user to a grave.
    ///
    /// Returns `None` when the pair is already related.
    pub async fn create(
        &self,
        user_id: Uuid,
        grave_id: Uuid,
        relationship: Option<&str>,
        request_id: Option<Uuid>,
    ) -> Result<Option<RelationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_relation");
        let result = sqlx::query_as::<_, RelationEntity>(
            r#"
            INSERT INTO grave_related_users (user_id, grave_id, relationship, request_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, grave_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(grave_id)
        .bind(relationship)
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<RelationDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_relation_detail");
        let result = sqlx::query_as::<_, RelationDetailEntity>(&format!(
            "{RELATION_DETAIL_SELECT} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<RelationDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_relations_by_user");
        let result = sqlx::query_as::<_, RelationDetailEntity>(&format!(
            "{RELATION_DETAIL_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_by_grave(
        &self,
        grave_id: Uuid,
    ) -> Result<Vec<RelationDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_relations_by_grave");
        let result = sqlx::query_as::<_, RelationDetailEntity>(&format!(
            "{RELATION_DETAIL_SELECT} WHERE r.grave_id = $1 ORDER BY r.created_at"
        ))
        .bind(grave_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_relation");
        let result = sqlx::query("DELETE FROM grave_related_users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
