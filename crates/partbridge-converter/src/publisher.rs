//! Preview publication: store the raster, then point the project at it.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use partbridge_core::traits::project::ProjectRecordStore;
use partbridge_core::traits::storage::{ObjectStore, UploadOptions};
use partbridge_core::types::ProjectId;

use crate::cancel::or_cancelled;
use crate::error::ConversionError;
use crate::models::{PREVIEW_CONTENT_TYPE, PREVIEW_FORMAT, PublishedPreview};

/// Writes previews into the bucket and records their keys on projects.
#[derive(Debug, Clone)]
pub struct PreviewPublisher {
    store: Arc<dyn ObjectStore>,
    records: Arc<dyn ProjectRecordStore>,
    bucket: String,
    prefix: String,
}

impl PreviewPublisher {
    /// Create a publisher writing under `{prefix}/` in `bucket`.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        records: Arc<dyn ProjectRecordStore>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            records,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Key of a project's preview. One per project; regenerating overwrites it.
    pub fn preview_key(&self, project_id: &ProjectId) -> String {
        format!("{}/{}_preview.{PREVIEW_FORMAT}", self.prefix, project_id)
    }

    /// Upload `image` under the project's preview key (overwriting), then
    /// set the project's preview reference to that key.
    ///
    /// The record is only touched after the upload succeeded. A failed
    /// record update leaves the uploaded image in place.
    pub async fn publish(
        &self,
        project_id: &ProjectId,
        image: Bytes,
        cancel: &CancellationToken,
    ) -> Result<PublishedPreview, ConversionError> {
        let key = self.preview_key(project_id);
        let size_bytes = image.len() as u64;
        let options = UploadOptions::upsert(PREVIEW_CONTENT_TYPE);

        or_cancelled(cancel, self.store.upload(&self.bucket, &key, image, &options))
            .await?
            .map_err(|e| {
                error!(project_id = %project_id, key = %key, error = %e, "Preview upload failed");
                ConversionError::PreviewUploadFailed {
                    key: key.clone(),
                    reason: e.message,
                }
            })?;

        or_cancelled(cancel, self.records.set_preview_key(project_id, &key))
            .await?
            .map_err(|e| {
                error!(project_id = %project_id, key = %key, error = %e, "Project update failed");
                ConversionError::ProjectRecordUpdateFailed {
                    key: key.clone(),
                    reason: e.message,
                }
            })?;

        info!(project_id = %project_id, key = %key, size = size_bytes, "Preview published");
        Ok(PublishedPreview {
            storage_key: key,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use partbridge_core::error::AppError;
    use partbridge_core::result::AppResult;
    use partbridge_storage::providers::local::LocalObjectStore;

    #[derive(Debug, Default)]
    struct MemoryRecords {
        previews: Mutex<HashMap<String, String>>,
        fail: bool,
    }

    #[async_trait]
    impl ProjectRecordStore for MemoryRecords {
        async fn set_preview_key(&self, project_id: &ProjectId, preview_key: &str) -> AppResult<()> {
            if self.fail {
                return Err(AppError::database("connection refused"));
            }
            self.previews
                .lock()
                .unwrap()
                .insert(project_id.to_string(), preview_key.to_string());
            Ok(())
        }

        async fn health_check(&self) -> AppResult<bool> {
            Ok(!self.fail)
        }
    }

    /// Store that accepts nothing.
    #[derive(Debug)]
    struct ReadOnlyStore;

    #[async_trait]
    impl ObjectStore for ReadOnlyStore {
        fn provider_type(&self) -> &str {
            "read-only"
        }

        async fn health_check(&self) -> AppResult<bool> {
            Ok(true)
        }

        async fn download(&self, _bucket: &str, path: &str) -> AppResult<Bytes> {
            Err(AppError::not_found(format!("Object not found: {path}")))
        }

        async fn upload(
            &self,
            _bucket: &str,
            _path: &str,
            _data: Bytes,
            _options: &UploadOptions,
        ) -> AppResult<()> {
            Err(AppError::storage("bucket is read-only"))
        }
    }

    async fn local_store() -> (tempfile::TempDir, Arc<LocalObjectStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).await.unwrap();
        (dir, Arc::new(store))
    }

    #[tokio::test]
    async fn test_publish_uploads_then_records() {
        let (_dir, store) = local_store().await;
        let records = Arc::new(MemoryRecords::default());
        let publisher = PreviewPublisher::new(store.clone(), records.clone(), "project-files", "previews");
        let project = ProjectId::from("p-42");

        let published = publisher
            .publish(&project, Bytes::from_static(b"PNG1"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(published.storage_key, "previews/p-42_preview.png");
        assert_eq!(published.size_bytes, 4);
        assert_eq!(
            records.previews.lock().unwrap().get("p-42").map(String::as_str),
            Some("previews/p-42_preview.png")
        );
        let stored = store
            .download("project-files", "previews/p-42_preview.png")
            .await
            .unwrap();
        assert_eq!(&stored[..], b"PNG1");
    }

    #[tokio::test]
    async fn test_republish_overwrites_same_key() {
        let (_dir, store) = local_store().await;
        let records = Arc::new(MemoryRecords::default());
        let publisher = PreviewPublisher::new(store.clone(), records, "project-files", "/previews/");
        let project = ProjectId::from("p-42");

        let first = publisher
            .publish(&project, Bytes::from_static(b"old"), &CancellationToken::new())
            .await
            .unwrap();
        let second = publisher
            .publish(&project, Bytes::from_static(b"new"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(first.storage_key, second.storage_key);
        let stored = store.download("project-files", &second.storage_key).await.unwrap();
        assert_eq!(&stored[..], b"new");
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_record_untouched() {
        let records = Arc::new(MemoryRecords::default());
        let publisher =
            PreviewPublisher::new(Arc::new(ReadOnlyStore), records.clone(), "project-files", "previews");

        let err = publisher
            .publish(&ProjectId::from("p-1"), Bytes::from_static(b"PNG"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConversionError::PreviewUploadFailed { ref key, .. } if key == "previews/p-1_preview.png"
        ));
        assert_eq!(err.to_string(), "Failed to upload preview: bucket is read-only");
        assert!(records.previews.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_keeps_uploaded_preview() {
        let (_dir, store) = local_store().await;
        let records = Arc::new(MemoryRecords {
            fail: true,
            ..MemoryRecords::default()
        });
        let publisher = PreviewPublisher::new(store.clone(), records, "project-files", "previews");

        let err = publisher
            .publish(&ProjectId::from("p-1"), Bytes::from_static(b"PNG"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to update project: connection refused");
        assert!(
            store
                .download("project-files", "previews/p-1_preview.png")
                .await
                .is_ok()
        );
    }
}
