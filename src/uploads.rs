//! Local blob storage for admin-submitted images, served under /uploads.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Error, Result};

/// Public URL prefix under which the uploads directory is served
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct Uploads {
    root: PathBuf,
}

impl Uploads {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an uploaded image under a fresh random name, keeping the
    /// original extension. Returns the public URL of the stored blob.
    pub async fn save_image(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");

        if bytes.is_empty() {
            return Err(Error::BadRequest("Uploaded file is empty".to_string()));
        }

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&file_name), bytes).await?;

        tracing::info!("Stored upload {} ({} bytes)", file_name, bytes.len());
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_image_returns_public_url() {
        let dir = tempfile::tempdir().expect("temp dir");
        let uploads = Uploads::new(dir.path().to_path_buf());

        let url = uploads
            .save_image("bulletin.png", b"fake image bytes")
            .await
            .expect("save succeeds");

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let stored = dir.path().join(url.trim_start_matches("/uploads/"));
        let bytes = std::fs::read(stored).expect("file exists");
        assert_eq!(bytes, b"fake image bytes");
    }

    #[tokio::test]
    async fn test_save_image_rejects_empty_payload() {
        let dir = tempfile::tempdir().expect("temp dir");
        let uploads = Uploads::new(dir.path().to_path_buf());

        assert!(uploads.save_image("empty.png", b"").await.is_err());
    }

    #[tokio::test]
    async fn test_suspicious_extension_is_normalized() {
        let dir = tempfile::tempdir().expect("temp dir");
        let uploads = Uploads::new(dir.path().to_path_buf());

        let url = uploads
            .save_image("weird.p/../ng", b"payload")
            .await
            .expect("save succeeds");
        assert!(url.ends_with(".bin"));
    }
}
