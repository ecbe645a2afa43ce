//! Asset storage for uploaded media files.
//!
//! Binary payloads (video files, thumbnails, avatars, banners) live outside
//! the database behind [`AssetStore`]: store bytes, get back a durable URL.
//! The local filesystem backend serves files through the `/assets` static
//! route; a CDN-backed implementation would slot in behind the same trait.

use std::path::PathBuf;

use axum::body::Bytes;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist an uploaded file and return the URL it will be served from.
    async fn store(
        &self,
        field: &str,
        original_name: &str,
        bytes: Bytes,
    ) -> Result<String, AssetError>;
}

pub struct LocalAssetStore {
    root: PathBuf,
    public_base: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait::async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(
        &self,
        field: &str,
        original_name: &str,
        bytes: Bytes,
    ) -> Result<String, AssetError> {
        let extension = std::path::Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let file_name = format!("{field}-{}{extension}", Uuid::new_v4().simple());
        let path = self.root.join(&file_name);

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, &bytes).await?;

        debug!(field, bytes = bytes.len(), "stored asset {}", path.display());

        Ok(format!("{}/{file_name}", self.public_base))
    }
}
