//! Object store trait for pluggable bucket backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Options applied to an object upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Replace an existing object at the same key instead of failing.
    pub upsert: bool,
    /// MIME type recorded with the object.
    pub content_type: String,
}

impl UploadOptions {
    /// Overwrite-allowed upload with the given content type.
    pub fn upsert(content_type: impl Into<String>) -> Self {
        Self {
            upsert: true,
            content_type: content_type.into(),
        }
    }
}

/// Trait for bucket-addressed object storage.
///
/// Implementations exist for the hosted storage REST API and the local
/// filesystem. Keys are always bucket-relative.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "supabase").
    fn provider_type(&self) -> &str;

    /// Describe a missing credential or endpoint, if any. A store that
    /// reports something here fails every call it receives.
    fn missing_configuration(&self) -> Option<&'static str> {
        None
    }

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read an object into memory.
    async fn download(&self, bucket: &str, path: &str) -> AppResult<Bytes>;

    /// Write an object.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> AppResult<()>;
}
