//! Service request entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::grave::{GraveAttributes, GraveSummary};
use domain::models::request::{
    RequestLog, RequestResponse, RequestStatus, RequestStatusRecord, ServiceRequest,
};
use domain::models::user::UserBrief;

/// Database row mapping for the requests table.
#[derive(Debug, Clone, FromRow)]
pub struct RequestEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub grave_id: Option<Uuid>,
    pub details: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RequestEntity> for ServiceRequest {
    fn from(entity: RequestEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            grave_id: entity.grave_id,
            details: entity.details,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the request_status table.
#[derive(Debug, Clone, FromRow)]
pub struct RequestStatusEntity {
    pub id: Uuid,
    pub request_id: Uuid,
    pub status: String,
    pub remark: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl RequestStatusEntity {
    pub fn status(&self) -> RequestStatus {
        parse_status(&self.status)
    }
}

/// Database row mapping for the request_logs table, joined with the author.
#[derive(Debug, Clone, FromRow)]
pub struct RequestLogEntity {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<RequestLogEntity> for RequestLog {
    fn from(entity: RequestLogEntity) -> Self {
        Self {
            id: entity.id,
            request_id: entity.request_id,
            user_id: entity.user_id,
            user_name: entity.user_name,
            message: entity.message,
            created_at: entity.created_at,
        }
    }
}

/// A request joined with its status row, requester and grave.
///
/// Status columns are nullable because the join is a LEFT JOIN.
#[derive(Debug, Clone, FromRow)]
pub struct RequestDetailEntity {
    #[sqlx(flatten)]
    pub request: RequestEntity,
    pub status: Option<String>,
    pub status_remark: Option<String>,
    pub status_updated_by: Option<Uuid>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub requester_name: String,
    pub grave_cluster_id: Option<Uuid>,
    pub grave_cluster_name: Option<String>,
    pub grave_details: Option<serde_json::Value>,
}

impl RequestDetailEntity {
    /// Builds the API view, classifying overdue against `now`.
    pub fn into_response(self, now: DateTime<Utc>) -> RequestResponse {
        let status = match (self.status.as_deref(), self.status_updated_at) {
            (Some(status), Some(updated_at)) => Some(RequestStatusRecord {
                status: parse_status(status),
                remark: self.status_remark,
                updated_by: self.status_updated_by,
                updated_at,
            }),
            _ => None,
        };

        let grave = match (
            self.request.grave_id,
            self.grave_cluster_id,
            self.grave_cluster_name,
        ) {
            (Some(id), Some(cluster_id), Some(cluster_name)) => {
                let attrs = self
                    .grave_details
                    .map(GraveAttributes::from_json)
                    .unwrap_or_default();
                Some(GraveSummary {
                    id,
                    cluster_id,
                    cluster_name,
                    deceased_name: attrs.deceased_name,
                    plot_number: attrs.plot_number,
                })
            }
            _ => None,
        };

        let requester = UserBrief {
            id: self.request.user_id,
            display_name: self.requester_name,
        };

        let mut response = RequestResponse::build(self.request.into(), status, now);
        response.requester = Some(requester);
        response.grave = grave;
        response
    }
}

/// Status column value; unknown strings read as pending.
fn parse_status(value: &str) -> RequestStatus {
    value.parse().unwrap_or(RequestStatus::Pending)
}
