use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// Filesystem seam shared by the asset generator and the video assembler.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Writes `content`, creating missing parent directories first.
    async fn write(&self, path: &Path, content: &[u8]) -> Result<()>;
    async fn exists(&self, path: &Path) -> Result<bool>;
    async fn delete(&self, path: &Path) -> Result<()>;
    async fn create_dir_all(&self, path: &Path) -> Result<()>;
}

pub struct NativeStorage;

impl NativeStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for NativeStorage {
    async fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path).await? {
            if path.is_dir() {
                tokio::fs::remove_dir_all(path).await?;
            } else {
                tokio::fs::remove_file(path).await?;
            }
        }
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path).await? {
            tokio::fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory {}", path.display()))?;
            log::info!("Directory '{}' created.", path.display());
        }
        Ok(())
    }
}
