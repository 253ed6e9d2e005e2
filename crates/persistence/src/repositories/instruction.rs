//! Cluster instruction repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::instruction::ClusterInstructions;

use crate::entities::{InstructionEntity, InstructionStepEntity};
use crate::metrics::QueryTimer;

/// One step to store.
#[derive(Debug, Clone)]
pub struct StepRow<'a> {
    pub step_number: i32,
    pub description: &'a str,
    pub image_url: Option<&'a str>,
}

/// Repository for per-cluster wayfinding instructions.
#[derive(Clone)]
pub struct InstructionRepository {
    pool: PgPool,
}

impl InstructionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_cluster(
        &self,
        cluster_id: Uuid,
    ) -> Result<Option<ClusterInstructions>, sqlx::Error> {
        let timer = QueryTimer::new("find_instructions_by_cluster");
        let header = sqlx::query_as::<_, InstructionEntity>(
            "SELECT * FROM cluster_instructions WHERE cluster_id = $1",
        )
        .bind(cluster_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            timer.record();
            return Ok(None);
        };

        let steps = sqlx::query_as::<_, InstructionStepEntity>(
            r#"
            SELECT * FROM cluster_instruction_steps
            WHERE instruction_id = $1
            ORDER BY step_number
            "#,
        )
        .bind(header.id)
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(Some(header.with_steps(steps)))
    }

    /// Replaces the cluster's instructions and all of their steps in one
    /// transaction.
    pub async fn upsert(
        &self,
        cluster_id: Uuid,
        title: &str,
        steps: &[StepRow<'_>],
    ) -> Result<ClusterInstructions, sqlx::Error> {
        let timer = QueryTimer::new("upsert_instructions");
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, InstructionEntity>(
            r#"
            INSERT INTO cluster_instructions (cluster_id, title)
            VALUES ($1, $2)
            ON CONFLICT (cluster_id) DO UPDATE
                SET title = EXCLUDED.title, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(cluster_id)
        .bind(title)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cluster_instruction_steps WHERE instruction_id = $1")
            .bind(header.id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(steps.len());
        for step in steps {
            let row = sqlx::query_as::<_, InstructionStepEntity>(
                r#"
                INSERT INTO cluster_instruction_steps
                    (instruction_id, step_number, description, image_url)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(header.id)
            .bind(step.step_number)
            .bind(step.description)
            .bind(step.image_url)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        timer.record();
        Ok(header.with_steps(stored))
    }

    /// Removes the cluster's instructions; steps go with them.
    pub async fn delete_by_cluster(&self, cluster_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_instructions");
        let result = sqlx::query("DELETE FROM cluster_instructions WHERE cluster_id = $1")
            .bind(cluster_id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
