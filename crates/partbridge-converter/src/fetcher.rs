//! Source file download from the object store.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use partbridge_core::traits::storage::ObjectStore;

use crate::cancel::or_cancelled;
use crate::error::ConversionError;
use crate::reference::CanonicalStoragePath;

/// Reads uploaded CAD files out of the project-files bucket.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl SourceFetcher {
    /// Create a fetcher for `bucket`.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Download the whole object at `path`.
    pub async fn fetch(
        &self,
        path: &CanonicalStoragePath,
        cancel: &CancellationToken,
    ) -> Result<Bytes, ConversionError> {
        let download = self.store.download(&self.bucket, path.as_str());
        match or_cancelled(cancel, download).await? {
            Ok(data) => {
                debug!(bucket = %self.bucket, path = %path, size = data.len(), "Source downloaded");
                Ok(data)
            }
            Err(e) => {
                error!(bucket = %self.bucket, path = %path, error = %e, "Source download failed");
                Err(ConversionError::DownloadFailed {
                    path: path.to_string(),
                    reason: e.message,
                })
            }
        }
    }
}
