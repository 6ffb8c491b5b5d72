use crate::error::AppError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Image staged to disk so the annotation client can read it as a file.
/// The file is removed when the guard drops, on success and failure paths
/// alike. Names combine wall-clock millis with the original file name;
/// concurrent identical uploads in the same millisecond can collide.
pub struct StagedImage {
    path: PathBuf,
}

impl StagedImage {
    pub async fn create(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        fs::create_dir_all(dir).await.map_err(|e| {
            AppError::FilesystemError(anyhow::anyhow!(
                "Failed to create staging directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let file_name = format!("{}-{}", chrono::Utc::now().timestamp_millis(), original_name);
        let path = dir.join(file_name);
        fs::write(&path, bytes).await.map_err(|e| {
            AppError::FilesystemError(anyhow::anyhow!(
                "Failed to stage image at {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Staged image for annotation");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        // Drop cannot await; the unlink is synchronous.
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged image");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("staging-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn staged_file_exists_until_guard_drops() {
        let dir = scratch_dir();
        let staged = StagedImage::create(&dir, "can.jpg", b"jpeg bytes")
            .await
            .unwrap();

        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg bytes");

        drop(staged);
        assert!(!path.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn staged_name_carries_original_file_name() {
        let dir = scratch_dir();
        let staged = StagedImage::create(&dir, "photo.png", &[0u8; 8]).await.unwrap();

        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("-photo.png"));
        let (millis, _) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());

        drop(staged);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
