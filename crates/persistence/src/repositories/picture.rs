//! Grave picture repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PictureEntity;
use crate::metrics::QueryTimer;

/// Row values for a new picture.
#[derive(Debug, Clone)]
pub struct NewPicture<'a> {
    pub grave_id: Uuid,
    pub url: &'a str,
    pub storage_key: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub caption: Option<&'a str>,
    pub uploaded_by: Option<Uuid>,
}

/// Repository for grave pictures.
#[derive(Clone)]
pub struct PictureRepository {
    pool: PgPool,
}

impl PictureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, picture: NewPicture<'_>) -> Result<PictureEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_picture");
        let result = sqlx::query_as::<_, PictureEntity>(
            r#"
            INSERT INTO grave_pictures
                (grave_id, url, storage_key, content_type, size_bytes, caption, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(picture.grave_id)
        .bind(picture.url)
        .bind(picture.storage_key)
        .bind(picture.content_type)
        .bind(picture.size_bytes)
        .bind(picture.caption)
        .bind(picture.uploaded_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Pictures of a grave, oldest first.
    pub async fn list_by_grave(&self, grave_id: Uuid) -> Result<Vec<PictureEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_pictures_by_grave");
        let result = sqlx::query_as::<_, PictureEntity>(
            "SELECT * FROM grave_pictures WHERE grave_id = $1 ORDER BY created_at, id",
        )
        .bind(grave_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether another picture row still points at `storage_key`.
    ///
    /// Keys are content addressed, so identical uploads share one file.
    pub async fn is_key_referenced(&self, storage_key: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("picture_key_referenced");
        let result: Result<(bool,), sqlx::Error> = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM grave_pictures WHERE storage_key = $1)",
        )
        .bind(storage_key)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(|(exists,)| exists)
    }

    /// Deletes a picture row, returning it so the file can be removed.
    pub async fn delete(&self, id: Uuid) -> Result<Option<PictureEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_picture");
        let result = sqlx::query_as::<_, PictureEntity>(
            "DELETE FROM grave_pictures WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
