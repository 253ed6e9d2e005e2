//! Cluster instruction entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::instruction::{ClusterInstructions, InstructionStep};

/// Database row mapping for the cluster_instructions table.
#[derive(Debug, Clone, FromRow)]
pub struct InstructionEntity {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row mapping for the cluster_instruction_steps table.
#[derive(Debug, Clone, FromRow)]
pub struct InstructionStepEntity {
    pub id: Uuid,
    pub instruction_id: Uuid,
    pub step_number: i32,
    pub description: String,
    pub image_url: Option<String>,
}

impl From<InstructionStepEntity> for InstructionStep {
    fn from(entity: InstructionStepEntity) -> Self {
        Self {
            id: entity.id,
            step_number: entity.step_number,
            description: entity.description,
            image_url: entity.image_url,
        }
    }
}

impl InstructionEntity {
    /// Assembles the domain model; steps are sorted by step number.
    pub fn with_steps(self, steps: Vec<InstructionStepEntity>) -> ClusterInstructions {
        let mut steps: Vec<InstructionStep> = steps.into_iter().map(Into::into).collect();
        steps.sort_by_key(|s| s.step_number);
        ClusterInstructions {
            id: self.id,
            cluster_id: self.cluster_id,
            title: self.title,
            steps,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
