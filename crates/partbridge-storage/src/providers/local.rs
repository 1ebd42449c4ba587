//! Local filesystem object store.
//!
//! Each bucket is a directory under the configured root, and object keys
//! map to relative file paths inside it.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use partbridge_core::error::{AppError, ErrorKind};
use partbridge_core::result::AppResult;
use partbridge_core::traits::storage::{ObjectStore, UploadOptions};

/// Local filesystem object store.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    /// Directory containing one subdirectory per bucket.
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a new local object store rooted at the given path.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a bucket-relative key to a file path inside the bucket
    /// directory. Keys that would escape the bucket are rejected.
    fn resolve(&self, bucket: &str, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if bucket.is_empty() || bucket.contains('/') || escapes || relative.as_os_str().is_empty() {
            return Err(AppError::validation(format!(
                "Invalid object key '{path}' in bucket '{bucket}'"
            )));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn download(&self, bucket: &str, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(bucket, path)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read object: {path}"),
                    e,
                )
            }
        })?;

        debug!(bucket, path, bytes = data.len(), "Read object");
        Ok(Bytes::from(data))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> AppResult<()> {
        let full_path = self.resolve(bucket, path)?;

        if !options.upsert && fs::try_exists(&full_path).await.unwrap_or(false) {
            return Err(AppError::conflict(format!("Object already exists: {path}")));
        }

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write object: {path}"),
                e,
            )
        })?;

        debug!(
            bucket,
            path,
            bytes = data.len(),
            content_type = %options.content_type,
            "Wrote object"
        );
        Ok(())
    }
}
