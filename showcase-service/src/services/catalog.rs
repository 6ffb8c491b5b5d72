use crate::error::AppError;
use std::path::PathBuf;
use std::sync::RwLock;
use tokio::fs;

/// Static product list, loaded once at startup and re-read only on an
/// explicit `reload`. The text is handed to the annotator with every
/// request.
pub struct ProductCatalog {
    path: PathBuf,
    contents: RwLock<String>,
}

impl ProductCatalog {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let contents = fs::read_to_string(&path).await.map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to read product catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::info!(path = %path.display(), bytes = contents.len(), "Loaded product catalog");
        Ok(Self {
            path,
            contents: RwLock::new(contents),
        })
    }

    pub fn contents(&self) -> String {
        self.contents.read().expect("catalog lock poisoned").clone()
    }

    pub async fn reload(&self) -> Result<(), AppError> {
        let fresh = fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to reload product catalog {}: {}",
                self.path.display(),
                e
            ))
        })?;
        *self.contents.write().expect("catalog lock poisoned") = fresh;
        tracing::info!(path = %self.path.display(), "Reloaded product catalog");
        Ok(())
    }
}
