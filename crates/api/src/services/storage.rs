//! Picture file storage.
//!
//! Uploads arrive base64-encoded. Files are content-addressed: the storage
//! key is derived from the SHA-256 of the bytes, so identical uploads share
//! one file and deleting a picture must check whether another row still
//! references the key.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use domain::models::picture::{is_allowed_picture_type, UploadPictureRequest};
use shared::crypto::content_storage_key;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an upload payload was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Picture content is not valid base64")]
    InvalidEncoding,

    #[error("Picture is empty")]
    Empty,

    #[error("Picture exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("Content type could not be determined; set contentType or fileName")]
    UnknownContentType,

    #[error("Unsupported picture type: {0}")]
    UnsupportedType(String),
}

/// A validated, decoded upload ready to be stored.
#[derive(Debug, Clone)]
pub struct DecodedPicture {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub storage_key: String,
}

/// Decodes and checks an upload against the size limit and the accepted
/// image types. A `data:<type>;base64,` prefix is tolerated.
pub fn decode_upload(
    request: &UploadPictureRequest,
    max_bytes: usize,
) -> Result<DecodedPicture, UploadError> {
    let encoded = strip_data_url(request.content_base64.trim());

    // Base64 expands by 4/3; reject obviously oversized payloads before decoding.
    if encoded.len() / 4 * 3 > max_bytes + 3 {
        return Err(UploadError::TooLarge(max_bytes));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| UploadError::InvalidEncoding)?;
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(UploadError::TooLarge(max_bytes));
    }

    let content_type = resolve_content_type(request)?;
    let storage_key = content_storage_key(&bytes, extension_for(&content_type));

    Ok(DecodedPicture {
        bytes,
        content_type,
        storage_key,
    })
}

fn strip_data_url(value: &str) -> &str {
    match value.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => value,
    }
}

fn resolve_content_type(request: &UploadPictureRequest) -> Result<String, UploadError> {
    let content_type = match request.content_type.as_deref().map(str::trim) {
        Some(explicit) if !explicit.is_empty() => explicit.to_ascii_lowercase(),
        _ => request
            .file_name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|mime| mime.essence_str().to_string())
            .ok_or(UploadError::UnknownContentType)?,
    };

    if !is_allowed_picture_type(&content_type) {
        return Err(UploadError::UnsupportedType(content_type));
    }
    Ok(content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Backend holding picture bytes.
#[async_trait]
pub trait PictureStorage: Send + Sync {
    /// Writes `bytes` under `key`. Writing an existing key is a no-op.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Removes `key`. A missing file is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// URL under which `key` is served.
    fn public_url(&self, key: &str) -> String;
}

/// Stores pictures on the local filesystem below `root`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PictureStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if tokio::fs::try_exists(&path).await? {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a temporary name first so readers never see a partial file.
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
