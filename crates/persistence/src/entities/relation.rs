//! Grave relation entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::grave::{GraveAttributes, GraveSummary};
use domain::models::relation::{GraveRelation, RelationResponse};
use domain::models::user::UserBrief;

/// Database row mapping for the grave_related_users table.
#[derive(Debug, Clone, FromRow)]
pub struct RelationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub grave_id: Uuid,
    pub relationship: Option<String>,
    pub request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<RelationEntity> for GraveRelation {
    fn from(entity: RelationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            grave_id: entity.grave_id,
            relationship: entity.relationship,
            request_id: entity.request_id,
            created_at: entity.created_at,
        }
    }
}

/// Relation joined with the user, grave and cluster it points at.
#[derive(Debug, Clone, FromRow)]
pub struct RelationDetailEntity {
    #[sqlx(flatten)]
    pub relation: RelationEntity,
    pub user_display_name: String,
    pub cluster_id: Uuid,
    pub cluster_name: String,
    pub grave_details: serde_json::Value,
}

impl From<RelationDetailEntity> for RelationResponse {
    fn from(entity: RelationDetailEntity) -> Self {
        let attrs = GraveAttributes::from_json(entity.grave_details);
        Self {
            id: entity.relation.id,
            user: UserBrief {
                id: entity.relation.user_id,
                display_name: entity.user_display_name,
            },
            grave: GraveSummary {
                id: entity.relation.grave_id,
                cluster_id: entity.cluster_id,
                cluster_name: entity.cluster_name,
                deceased_name: attrs.deceased_name,
                plot_number: attrs.plot_number,
            },
            relationship: entity.relation.relationship,
            request_id: entity.relation.request_id,
            created_at: entity.relation.created_at,
        }
    }
}
