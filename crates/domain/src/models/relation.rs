//! Grave relations: links between users and the graves they are kin to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::grave::GraveSummary;
use super::user::UserBrief;

/// Link between a user and a grave.
///
/// `request_id` is set when the relation was granted in response to a
/// service request; deleting that request removes the relation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraveRelation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub grave_id: Uuid,
    pub relationship: Option<String>,
    pub request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Admin request to relate a user to a grave.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationRequest {
    pub user_id: Uuid,
    pub grave_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Relationship must be 1-100 characters"))]
    pub relationship: Option<String>,

    pub request_id: Option<Uuid>,
}

/// Relation as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationResponse {
    pub id: Uuid,
    pub user: UserBrief,
    pub grave: GraveSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
