//! Grave details domain model.
//!
//! Grave attributes are stored as a free-form JSON document. The known keys
//! are typed here; anything else is carried through untouched in `extra`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// The attribute payload of a burial plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GraveAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Deceased name must be at most 200 characters"))]
    pub deceased_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50, message = "Plot number must be 1-50 characters"))]
    pub plot_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50, message = "Grave type must be at most 50 characters"))]
    pub grave_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraveAttributes {
    /// Reads attributes from a stored JSON document.
    ///
    /// Rows written by older clients may hold values of unexpected types; in
    /// that case the whole document is kept under `extra`.
    pub fn from_json(value: Value) -> Self {
        match serde_json::from_value::<GraveAttributes>(value.clone()) {
            Ok(attrs) => attrs,
            Err(_) => match value {
                Value::Object(map) => GraveAttributes {
                    extra: map,
                    ..Default::default()
                },
                other => {
                    let mut extra = Map::new();
                    extra.insert("raw".to_string(), other);
                    GraveAttributes {
                        extra,
                        ..Default::default()
                    }
                }
            },
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Object(Map::new()))
    }

    /// Applies the keys present in `patch`; absent keys are preserved.
    pub fn merge(&mut self, patch: GraveAttributes) {
        if patch.deceased_name.is_some() {
            self.deceased_name = patch.deceased_name;
        }
        if patch.birth_date.is_some() {
            self.birth_date = patch.birth_date;
        }
        if patch.death_date.is_some() {
            self.death_date = patch.death_date;
        }
        if patch.plot_number.is_some() {
            self.plot_number = patch.plot_number;
        }
        if patch.grave_type.is_some() {
            self.grave_type = patch.grave_type;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        self.extra.extend(patch.extra);
    }
}

/// A single burial plot record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraveDetails {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub details: GraveAttributes,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a grave.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGraveRequest {
    pub cluster_id: Uuid,

    #[validate(nested)]
    pub details: GraveAttributes,

    pub expiration_date: Option<NaiveDate>,
}

/// Partial update for a grave. `details` keys are merged into the stored
/// document; `clearExpiration` removes the expiration date.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGraveRequest {
    pub cluster_id: Option<Uuid>,

    #[validate(nested)]
    pub details: Option<GraveAttributes>,

    pub expiration_date: Option<NaiveDate>,

    #[serde(default)]
    pub clear_expiration: bool,
}

/// Query for listing graves.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGravesQuery {
    pub cluster_id: Option<Uuid>,
}

/// Grave as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraveResponse {
    pub id: Uuid,
    pub cluster_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    pub details: GraveAttributes,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GraveDetails> for GraveResponse {
    fn from(g: GraveDetails) -> Self {
        Self {
            id: g.id,
            cluster_id: g.cluster_id,
            cluster_name: None,
            details: g.details,
            expiration_date: g.expiration_date,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

impl GraveResponse {
    pub fn with_cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = Some(name.into());
        self
    }
}

/// Compact grave reference embedded in requests and relations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraveSummary {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub cluster_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_number: Option<String>,
}
