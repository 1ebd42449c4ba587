//! Conversion processor: runs one request through every pipeline step,
//! in order, stopping at the first failure.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use partbridge_core::config::{ConversionConfig, StorageConfig};
use partbridge_core::result::AppResult;
use partbridge_core::traits::project::ProjectRecordStore;
use partbridge_core::traits::storage::ObjectStore;

use crate::client::JobClient;
use crate::error::ConversionError;
use crate::fetcher::SourceFetcher;
use crate::metrics::ConversionMetrics;
use crate::models::{ConversionOutcome, ConversionRequest, PublishedPreview};
use crate::publisher::PreviewPublisher;
use crate::reference::FileReference;

/// Reported when no job API credential is configured.
const MISSING_API_KEY: &str = "CloudConvert API key not configured";

/// The preview conversion processor.
#[derive(Debug, Clone)]
pub struct ConversionProcessor {
    client: JobClient,
    fetcher: SourceFetcher,
    publisher: PreviewPublisher,
    store: Arc<dyn ObjectStore>,
    records: Arc<dyn ProjectRecordStore>,
    /// Public-object URL marker of the project-files bucket.
    marker: String,
    metrics: Arc<ConversionMetrics>,
}

impl ConversionProcessor {
    /// Create a processor over the given object store and project records.
    pub fn new(
        conversion: &ConversionConfig,
        storage: &StorageConfig,
        store: Arc<dyn ObjectStore>,
        records: Arc<dyn ProjectRecordStore>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: JobClient::new(conversion)?,
            fetcher: SourceFetcher::new(Arc::clone(&store), storage.bucket.clone()),
            publisher: PreviewPublisher::new(
                Arc::clone(&store),
                Arc::clone(&records),
                storage.bucket.clone(),
                conversion.preview_prefix.clone(),
            ),
            store,
            records,
            marker: storage.public_url_marker(),
            metrics: Arc::new(ConversionMetrics::new()),
        })
    }

    /// Shared metrics collector.
    pub fn metrics(&self) -> Arc<ConversionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Backend name of the object store.
    pub fn storage_provider(&self) -> &str {
        self.store.provider_type()
    }

    /// First missing credential, if any. Checked before every conversion.
    pub fn missing_configuration(&self) -> Option<&'static str> {
        if !self.client.has_credentials() {
            return Some(MISSING_API_KEY);
        }
        self.store.missing_configuration()
    }

    /// Check the object store and the project records, describing each
    /// backend that does not answer.
    pub async fn unreachable_backends(&self) -> Vec<String> {
        let mut unreachable = Vec::new();

        match self.store.health_check().await {
            Ok(true) => {}
            Ok(false) => unreachable.push(format!(
                "object store ({}) unreachable",
                self.store.provider_type()
            )),
            Err(e) => unreachable.push(format!(
                "object store ({}): {}",
                self.store.provider_type(),
                e.message
            )),
        }

        match self.records.health_check().await {
            Ok(true) => {}
            Ok(false) => unreachable.push("project records unreachable".to_string()),
            Err(e) => unreachable.push(format!("project records: {}", e.message)),
        }

        if !unreachable.is_empty() {
            warn!(?unreachable, "Backend health check failed");
        }
        unreachable
    }

    /// Convert the request's source file into a published preview.
    ///
    /// Cancelling `cancel` abandons the conversion at the next network call
    /// or poll delay.
    #[instrument(skip(self, request, cancel), fields(project_id = %request.project_id))]
    pub async fn convert(
        &self,
        request: ConversionRequest,
        cancel: CancellationToken,
    ) -> ConversionOutcome {
        self.metrics.record_started();
        let start = Instant::now();

        let result = self.run_pipeline(&request, &cancel).await;

        match &result {
            Ok(preview) => {
                let elapsed = start.elapsed();
                self.metrics.record_success(elapsed, preview.size_bytes);
                info!(
                    preview_key = %preview.storage_key,
                    size = preview.size_bytes,
                    duration_ms = elapsed.as_millis() as u64,
                    "Preview conversion completed"
                );
            }
            Err(e) => {
                self.metrics.record_error(e);
                match e.stage() {
                    Some(stage) => error!(
                        stage = %stage,
                        source_ref = %request.source_ref,
                        error = %e,
                        "Preview conversion failed"
                    ),
                    None => warn!(source_ref = %request.source_ref, "Preview conversion cancelled"),
                }
            }
        }

        result
    }

    async fn run_pipeline(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<PublishedPreview, ConversionError> {
        if let Some(what) = self.missing_configuration() {
            return Err(ConversionError::ConfigurationMissing { what });
        }
        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        let reference = FileReference::parse(&request.source_ref, &self.marker)?;
        debug!(
            kind = reference.kind(),
            path = %reference.storage_path(),
            "File reference resolved"
        );
        let path = reference.into_storage_path();

        let source = self.fetcher.fetch(&path, cancel).await?;
        self.metrics.record_input(source.len() as u64);

        let (job, form) = self.client.create_job(cancel).await?;
        self.client
            .upload_input(&form, path.file_name(), source, cancel)
            .await?;
        let job = self.client.await_completion(job, cancel).await?;
        let image = self.client.fetch_output(&job, cancel).await?;

        self.publisher
            .publish(&request.project_id, image, cancel)
            .await
    }
}
