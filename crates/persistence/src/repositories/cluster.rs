//! Grave cluster repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ClusterEntity, ClusterWithCountEntity};
use crate::metrics::QueryTimer;

const CLUSTER_WITH_COUNT_SELECT: &str = r#"
    SELECT c.id, c.name, c.cluster_number, c.latitude, c.longitude, c.description,
           c.created_at, c.updated_at,
           (SELECT COUNT(*) FROM grave_details g WHERE g.cluster_id = c.id) AS grave_count
    FROM grave_clusters c
"#;

/// Outcome of a cluster delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterDeletion {
    Deleted,
    NotFound,
    /// The cluster still holds graves and was left in place.
    HasGraves(i64),
}

/// Repository for grave clusters.
#[derive(Clone)]
pub struct ClusterRepository {
    pool: PgPool,
}

impl ClusterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a cluster. Without an explicit number the next free one
    /// (current maximum plus one) is assigned.
    pub async fn create(
        &self,
        name: &str,
        cluster_number: Option<i32>,
        latitude: f64,
        longitude: f64,
        description: Option<&str>,
    ) -> Result<ClusterEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_cluster");
        let result = sqlx::query_as::<_, ClusterEntity>(
            r#"
            INSERT INTO grave_clusters (name, cluster_number, latitude, longitude, description)
            VALUES (
                $1,
                COALESCE($2, (SELECT COALESCE(MAX(cluster_number), 0) + 1 FROM grave_clusters)),
                $3, $4, $5
            )
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(cluster_number)
        .bind(latitude)
        .bind(longitude)
        .bind(description)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ClusterEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_cluster_by_id");
        let result =
            sqlx::query_as::<_, ClusterEntity>("SELECT * FROM grave_clusters WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    pub async fn find_with_count(
        &self,
        id: Uuid,
    ) -> Result<Option<ClusterWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_cluster_with_count");
        let result = sqlx::query_as::<_, ClusterWithCountEntity>(&format!(
            "{CLUSTER_WITH_COUNT_SELECT} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All clusters ordered by cluster number.
    pub async fn list_with_counts(&self) -> Result<Vec<ClusterWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_clusters");
        let result = sqlx::query_as::<_, ClusterWithCountEntity>(&format!(
            "{CLUSTER_WITH_COUNT_SELECT} ORDER BY c.cluster_number"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update; `None` keeps the stored value.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        cluster_number: Option<i32>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        description: Option<&str>,
    ) -> Result<Option<ClusterEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_cluster");
        let result = sqlx::query_as::<_, ClusterEntity>(
            r#"
            UPDATE grave_clusters SET
                name = COALESCE($2, name),
                cluster_number = COALESCE($3, cluster_number),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                description = COALESCE($6, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(cluster_number)
        .bind(latitude)
        .bind(longitude)
        .bind(description)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a cluster unless graves still reference it.
    pub async fn delete(&self, id: Uuid) -> Result<ClusterDeletion, sqlx::Error> {
        let timer = QueryTimer::new("delete_cluster");
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM grave_clusters WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            timer.record();
            return Ok(ClusterDeletion::NotFound);
        }

        let graves: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM grave_details WHERE cluster_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if graves.0 > 0 {
            timer.record();
            return Ok(ClusterDeletion::HasGraves(graves.0));
        }

        sqlx::query("DELETE FROM grave_clusters WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        timer.record();
        Ok(ClusterDeletion::Deleted)
    }
}
