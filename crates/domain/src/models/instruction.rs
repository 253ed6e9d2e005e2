//! Cluster instructions: ordered directions for reaching or maintaining a
//! cluster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One step of a cluster's directions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionStep {
    pub id: Uuid,
    pub step_number: i32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Directions for a cluster. Steps are ordered by `step_number`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInstructions {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub title: String,
    pub steps: Vec<InstructionStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A step as submitted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    #[validate(length(min = 1, max = 2000, message = "Step description must be 1-2000 characters"))]
    pub description: String,

    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Replaces a cluster's instructions.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertInstructionsRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(
        length(min = 1, max = 50, message = "Between 1 and 50 steps are required"),
        nested
    )]
    pub steps: Vec<StepInput>,
}

/// Step numbers assigned to submitted steps, 1-based in submission order.
pub fn number_steps(steps: &[StepInput]) -> Vec<(i32, &StepInput)> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| (i as i32 + 1, step))
        .collect()
}
