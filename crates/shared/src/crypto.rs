//! Content hashing helpers.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Builds a content-addressed storage key, e.g. `ab/ab12...ef.jpg`.
///
/// The first two hex characters become a directory so that a single
/// folder never accumulates every upload.
pub fn content_storage_key(bytes: &[u8], extension: &str) -> String {
    let digest = sha256_hex(bytes);
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() {
        format!("{}/{}", &digest[..2], digest)
    } else {
        format!("{}/{}.{}", &digest[..2], digest, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b"test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_storage_key_layout() {
        let key = content_storage_key(b"test", "JPG");
        assert_eq!(
            key,
            "9f/9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08.jpg"
        );
    }

    #[test]
    fn test_content_storage_key_strips_dot_and_handles_missing_extension() {
        assert!(content_storage_key(b"x", ".png").ends_with(".png"));
        let bare = content_storage_key(b"x", "");
        assert!(!bare.contains('.'));
        assert_eq!(bare.len(), 2 + 1 + 64);
    }

    #[test]
    fn test_same_content_same_key() {
        assert_eq!(
            content_storage_key(b"photo", "png"),
            content_storage_key(b"photo", "png")
        );
        assert_ne!(
            content_storage_key(b"photo-a", "png"),
            content_storage_key(b"photo-b", "png")
        );
    }
}
