//! Grave cluster domain model.

use chrono::{DateTime, Utc};
use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A named, geolocated grouping of grave plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraveCluster {
    pub id: Uuid,
    pub name: String,
    pub cluster_number: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GraveCluster {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: f64,
}

impl Coordinates {
    /// Great-circle distance in meters.
    pub fn distance_meters(&self, other: &Coordinates) -> f64 {
        let a = Point::new(self.longitude, self.latitude);
        let b = Point::new(other.longitude, other.latitude);
        a.haversine_distance(&b)
    }
}

/// Request payload for creating a cluster.
///
/// `clusterNumber` is assigned sequentially when omitted.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(range(min = 1, message = "Cluster number must be positive"))]
    pub cluster_number: Option<i32>,

    #[validate(nested)]
    pub coordinates: Coordinates,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// Partial update for a cluster.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 1, message = "Cluster number must be positive"))]
    pub cluster_number: Option<i32>,

    #[validate(nested)]
    pub coordinates: Option<Coordinates>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// Cluster as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    pub id: Uuid,
    pub name: String,
    pub cluster_number: i32,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub grave_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClusterResponse {
    pub fn new(cluster: GraveCluster, grave_count: i64) -> Self {
        Self {
            id: cluster.id,
            coordinates: cluster.coordinates(),
            name: cluster.name,
            cluster_number: cluster.cluster_number,
            description: cluster.description,
            grave_count,
            created_at: cluster.created_at,
            updated_at: cluster.updated_at,
        }
    }
}

/// Query for the nearest clusters to a point.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearbyClustersQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: f64,

    #[serde(default = "default_nearby_limit")]
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: usize,
}

fn default_nearby_limit() -> usize {
    5
}

/// A cluster with its distance from the query point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyCluster {
    #[serde(flatten)]
    pub cluster: ClusterResponse,
    pub distance_meters: f64,
}

/// Orders clusters by distance from `origin` and keeps the closest `limit`.
pub fn rank_by_distance(
    origin: Coordinates,
    clusters: Vec<ClusterResponse>,
    limit: usize,
) -> Vec<NearbyCluster> {
    let mut ranked: Vec<NearbyCluster> = clusters
        .into_iter()
        .map(|cluster| NearbyCluster {
            distance_meters: origin.distance_meters(&cluster.coordinates),
            cluster,
        })
        .collect();
    ranked.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(name: &str, number: i32, lat: f64, lon: f64) -> ClusterResponse {
        ClusterResponse::new(
            GraveCluster {
                id: Uuid::new_v4(),
                name: name.to_string(),
                cluster_number: number,
                latitude: lat,
                longitude: lon,
                description: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            0,
        )
    }

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "name": "Garden of Peace",
            "clusterNumber": 1,
            "coordinates": {"latitude": 14.5995, "longitude": 120.9842}
        }"#;
        let req: CreateClusterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "Garden of Peace");
        assert_eq!(req.cluster_number, Some(1));
        assert_eq!(req.coordinates.latitude, 14.5995);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_bad_coordinates() {
        let json = r#"{
            "name": "Nowhere",
            "coordinates": {"latitude": 95.0, "longitude": 120.0}
        }"#;
        let req: CreateClusterRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_distance_meters_is_symmetric_and_plausible() {
        let manila = Coordinates {
            latitude: 14.5995,
            longitude: 120.9842,
        };
        let quezon = Coordinates {
            latitude: 14.6760,
            longitude: 121.0437,
        };
        let d1 = manila.distance_meters(&quezon);
        let d2 = quezon.distance_meters(&manila);
        assert!((d1 - d2).abs() < 1e-6);
        // roughly 10.6 km apart
        assert!(d1 > 9_000.0 && d1 < 12_000.0, "{}", d1);
    }

    #[test]
    fn test_rank_by_distance_orders_and_truncates() {
        let origin = Coordinates {
            latitude: 14.5995,
            longitude: 120.9842,
        };
        let ranked = rank_by_distance(
            origin,
            vec![
                cluster("Far", 3, 15.0, 121.5),
                cluster("Here", 1, 14.5995, 120.9842),
                cluster("Near", 2, 14.60, 120.99),
            ],
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].cluster.name, "Here");
        assert_eq!(ranked[1].cluster.name, "Near");
        assert!(ranked[0].distance_meters < 1.0);
    }

    #[test]
    fn test_cluster_response_serialization() {
        let json = serde_json::to_value(cluster("Garden of Peace", 1, 14.5995, 120.9842)).unwrap();
        assert_eq!(json["clusterNumber"], 1);
        assert_eq!(json["coordinates"]["latitude"], 14.5995);
        assert_eq!(json["graveCount"], 0);
        assert!(json.get("description").is_none());
    }
}
