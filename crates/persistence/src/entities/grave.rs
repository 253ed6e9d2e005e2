//! Grave details entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::expiration::{classify, ExpirationAlert};
use domain::models::grave::{GraveAttributes, GraveDetails, GraveResponse, GraveSummary};

/// Database row mapping for the grave_details table.
#[derive(Debug, Clone, FromRow)]
pub struct GraveEntity {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub details: serde_json::Value,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GraveEntity> for GraveDetails {
    fn from(entity: GraveEntity) -> Self {
        Self {
            id: entity.id,
            cluster_id: entity.cluster_id,
            details: GraveAttributes::from_json(entity.details),
            expiration_date: entity.expiration_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Grave row joined with its cluster's name.
#[derive(Debug, Clone, FromRow)]
pub struct GraveWithClusterEntity {
    #[sqlx(flatten)]
    pub grave: GraveEntity,
    pub cluster_name: String,
}

impl From<GraveWithClusterEntity> for GraveResponse {
    fn from(entity: GraveWithClusterEntity) -> Self {
        GraveResponse::from(GraveDetails::from(entity.grave)).with_cluster_name(entity.cluster_name)
    }
}

impl GraveWithClusterEntity {
    pub fn summary(&self) -> GraveSummary {
        let attrs = GraveAttributes::from_json(self.grave.details.clone());
        GraveSummary {
            id: self.grave.id,
            cluster_id: self.grave.cluster_id,
            cluster_name: self.cluster_name.clone(),
            deceased_name: attrs.deceased_name,
            plot_number: attrs.plot_number,
        }
    }

    /// Expiration alert for this grave, if its date falls inside the window.
    pub fn expiration_alert(&self, today: NaiveDate, window_days: i64) -> Option<ExpirationAlert> {
        let expiration_date = self.grave.expiration_date?;
        let (state, days_remaining) = classify(expiration_date, today, window_days)?;
        let summary = self.summary();
        Some(ExpirationAlert {
            grave_id: summary.id,
            cluster_id: summary.cluster_id,
            cluster_name: summary.cluster_name,
            deceased_name: summary.deceased_name,
            plot_number: summary.plot_number,
            expiration_date,
            days_remaining,
            state,
        })
    }
}
