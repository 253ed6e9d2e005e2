//! Grave details repository for database operations.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GraveEntity, GraveWithClusterEntity};
use crate::metrics::QueryTimer;

pub(crate) const GRAVE_WITH_CLUSTER_SELECT: &str = r#"
    SELECT g.id, g.cluster_id, g.details, g.expiration_date, g.created_at, g.updated_at,
           c.name AS cluster_name
    FROM grave_details g
    JOIN grave_clusters c ON c.id = g.cluster_id
"#;

/// Repository for grave records.
#[derive(Clone)]
pub struct GraveRepository {
    pool: PgPool,
}

impl GraveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a grave. An unknown cluster surfaces as a foreign key violation.
    pub async fn create(
        &self,
        cluster_id: Uuid,
        details: serde_json::Value,
        expiration_date: Option<NaiveDate>,
    ) -> Result<GraveEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_grave");
        let result = sqlx::query_as::<_, GraveEntity>(
            r#"
            INSERT INTO grave_details (cluster_id, details, expiration_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(cluster_id)
        .bind(details)
        .bind(expiration_date)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GraveEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_grave_by_id");
        let result = sqlx::query_as::<_, GraveEntity>("SELECT * FROM grave_details WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_with_cluster(
        &self,
        id: Uuid,
    ) -> Result<Option<GraveWithClusterEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_grave_with_cluster");
        let result = sqlx::query_as::<_, GraveWithClusterEntity>(&format!(
            "{GRAVE_WITH_CLUSTER_SELECT} WHERE g.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists graves, optionally restricted to one cluster.
    pub async fn list(
        &self,
        cluster_id: Option<Uuid>,
    ) -> Result<Vec<GraveWithClusterEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_graves");
        let result = sqlx::query_as::<_, GraveWithClusterEntity>(&format!(
            r#"
            {GRAVE_WITH_CLUSTER_SELECT}
            WHERE ($1::uuid IS NULL OR g.cluster_id = $1)
            ORDER BY c.cluster_number, g.details->>'plotNumber' NULLS LAST, g.created_at
            "#
        ))
        .bind(cluster_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Graves whose expiration date is on or before `cutoff`, soonest first.
    pub async fn list_expiring_before(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<GraveWithClusterEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_expiring_graves");
        let result = sqlx::query_as::<_, GraveWithClusterEntity>(&format!(
            r#"
            {GRAVE_WITH_CLUSTER_SELECT}
            WHERE g.expiration_date IS NOT NULL AND g.expiration_date <= $1
            ORDER BY g.expiration_date, c.cluster_number
            "#
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update. `details` replaces the stored document, so callers
    /// merge before calling.
    pub async fn update(
        &self,
        id: Uuid,
        cluster_id: Option<Uuid>,
        details: Option<serde_json::Value>,
        expiration_date: Option<NaiveDate>,
        clear_expiration: bool,
    ) -> Result<Option<GraveEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_grave");
        let result = sqlx::query_as::<_, GraveEntity>(
            r#"
            UPDATE grave_details SET
                cluster_id = COALESCE($2, cluster_id),
                details = COALESCE($3, details),
                expiration_date = CASE WHEN $5 THEN NULL
                                       ELSE COALESCE($4, expiration_date) END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(cluster_id)
        .bind(details)
        .bind(expiration_date)
        .bind(clear_expiration)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a grave and its pictures' rows.
    ///
    /// Returns the storage keys of the removed pictures so the caller can
    /// clean up files, or `None` when the grave did not exist.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Vec<String>>, sqlx::Error> {
        let timer = QueryTimer::new("delete_grave");
        let mut tx = self.pool.begin().await?;

        let keys: Vec<(String,)> =
            sqlx::query_as("DELETE FROM grave_pictures WHERE grave_id = $1 RETURNING storage_key")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let deleted = sqlx::query("DELETE FROM grave_details WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(keys.into_iter().map(|(k,)| k).collect()))
    }
}
