//! Grave picture domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Content types accepted for grave pictures.
pub const ALLOWED_PICTURE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// A picture attached to a grave.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GravePicture {
    pub id: Uuid,
    pub grave_id: Uuid,
    pub url: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub caption: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Upload payload. The image travels base64-encoded in the JSON body.
///
/// `contentType` wins over the type guessed from `fileName`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadPictureRequest {
    #[validate(length(min = 1, message = "Picture content is required"))]
    pub content_base64: String,

    pub content_type: Option<String>,

    #[validate(length(max = 255, message = "File name must be at most 255 characters"))]
    pub file_name: Option<String>,

    #[validate(length(max = 500, message = "Caption must be at most 500 characters"))]
    pub caption: Option<String>,
}

/// Whether `content_type` is an accepted image type.
pub fn is_allowed_picture_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_PICTURE_TYPES.contains(&essence.as_str())
}
