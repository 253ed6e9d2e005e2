//! Grave cluster entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::cluster::{ClusterResponse, GraveCluster};

/// Database row mapping for the grave_clusters table.
#[derive(Debug, Clone, FromRow)]
pub struct ClusterEntity {
    pub id: Uuid,
    pub name: String,
    pub cluster_number: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClusterEntity> for GraveCluster {
    fn from(entity: ClusterEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            cluster_number: entity.cluster_number,
            latitude: entity.latitude,
            longitude: entity.longitude,
            description: entity.description,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Cluster row joined with the number of graves it holds.
#[derive(Debug, Clone, FromRow)]
pub struct ClusterWithCountEntity {
    #[sqlx(flatten)]
    pub cluster: ClusterEntity,
    pub grave_count: i64,
}

impl From<ClusterWithCountEntity> for ClusterResponse {
    fn from(entity: ClusterWithCountEntity) -> Self {
        ClusterResponse::new(entity.cluster.into(), entity.grave_count)
    }
}
