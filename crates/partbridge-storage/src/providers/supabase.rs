//! Hosted storage REST API provider.
//!
//! Objects live at `{url}/storage/v1/object/{bucket}/{key}`; every call
//! carries the service key as both `apikey` and bearer token.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use partbridge_core::config::SupabaseStorageConfig;
use partbridge_core::error::{AppError, ErrorKind};
use partbridge_core::result::AppResult;
use partbridge_core::traits::storage::{ObjectStore, UploadOptions};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error body returned by the storage API.
#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Storage API object store.
#[derive(Debug, Clone)]
pub struct SupabaseObjectStore {
    client: Client,
    /// Project base URL; `None` when not configured.
    base_url: Option<Url>,
    service_key: String,
}

impl SupabaseObjectStore {
    /// Create a provider from configuration.
    ///
    /// Blank credentials are accepted; the store then reports itself as
    /// unconfigured and fails each call instead of failing startup.
    pub fn new(config: &SupabaseStorageConfig) -> AppResult<Self> {
        let base_url = if config.url.trim().is_empty() {
            None
        } else {
            Some(Url::parse(config.url.trim()).map_err(|e| {
                AppError::configuration(format!("Invalid storage URL '{}': {e}", config.url))
            })?)
        };

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            client,
            base_url,
            service_key: config.service_key.trim().to_string(),
        })
    }

    /// Build `{base}/storage/v1/{section}/{bucket}/{key...}` with each key
    /// segment percent-encoded.
    fn endpoint(&self, section: &str, bucket: &str, path: &str) -> AppResult<Url> {
        let mut url = self
            .base_url
            .clone()
            .ok_or_else(|| AppError::configuration("Storage URL not configured"))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::configuration("Storage URL cannot be a base URL"))?;
            segments
                .pop_if_empty()
                .extend(["storage", "v1", section])
                .extend(Some(bucket).filter(|b| !b.is_empty()))
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }

        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Turn a non-success response into an [`AppError`] carrying the API's
    /// own message when it sends one.
    async fn error_from_response(response: reqwest::Response, path: &str) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<StorageErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        match status {
            StatusCode::NOT_FOUND => AppError::not_found(format!("{detail} ({path})")),
            StatusCode::CONFLICT => AppError::conflict(detail),
            StatusCode::BAD_REQUEST if detail.to_lowercase().contains("not found") => {
                AppError::not_found(format!("{detail} ({path})"))
            }
            _ => AppError::storage(format!("{detail} (HTTP {})", status.as_u16())),
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseObjectStore {
    fn provider_type(&self) -> &str {
        "supabase"
    }

    fn missing_configuration(&self) -> Option<&'static str> {
        if self.base_url.is_none() || self.service_key.is_empty() {
            Some("Supabase storage credentials not configured")
        } else {
            None
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        if self.missing_configuration().is_some() {
            return Ok(false);
        }
        let url = self.endpoint("bucket", "", "")?;
        let response = self.authorized(self.client.get(url)).send().await;
        Ok(matches!(response, Ok(r) if r.status().is_success()))
    }

    async fn download(&self, bucket: &str, path: &str) -> AppResult<Bytes> {
        if let Some(missing) = self.missing_configuration() {
            return Err(AppError::configuration(missing));
        }
        let url = self.endpoint("object", bucket, path)?;

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("Storage request failed: {e}"), e)
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, path).await);
        }

        let data = response.bytes().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to read object body: {e}"), e)
        })?;

        debug!(bucket, path, bytes = data.len(), "Downloaded object");
        Ok(data)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> AppResult<()> {
        if let Some(missing) = self.missing_configuration() {
            return Err(AppError::configuration(missing));
        }
        let url = self.endpoint("object", bucket, path)?;
        let size = data.len();

        let response = self
            .authorized(self.client.post(url))
            .header(CONTENT_TYPE, &options.content_type)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(data)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("Storage request failed: {e}"), e)
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, path).await);
        }

        debug!(bucket, path, bytes = size, "Uploaded object");
        Ok(())
    }
}
