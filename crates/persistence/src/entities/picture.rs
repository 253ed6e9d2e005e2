//! Grave picture entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::picture::GravePicture;

/// Database row mapping for the grave_pictures table.
#[derive(Debug, Clone, FromRow)]
pub struct PictureEntity {
    pub id: Uuid,
    pub grave_id: Uuid,
    pub url: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub caption: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<PictureEntity> for GravePicture {
    fn from(entity: PictureEntity) -> Self {
        Self {
            id: entity.id,
            grave_id: entity.grave_id,
            url: entity.url,
            storage_key: entity.storage_key,
            content_type: entity.content_type,
            size_bytes: entity.size_bytes,
            caption: entity.caption,
            uploaded_by: entity.uploaded_by,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_entity_to_domain() {
        let entity = PictureEntity {
            id: Uuid::new_v4(),
            grave_id: Uuid::new_v4(),
            url: "/uploads/3f/3fa1.jpg".to_string(),
            storage_key: "3f/3fa1.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size_bytes: 2048,
            caption: Some("Headstone after cleaning".to_string()),
            uploaded_by: None,
            created_at: Utc::now(),
        };
        let picture: GravePicture = entity.clone().into();
        assert_eq!(picture.storage_key, entity.storage_key);
        assert_eq!(picture.size_bytes, 2048);
    }
}
