//! HTTP client for the conversion job API.
//!
//! One job per conversion: `import/upload` → `convert` (png) → `export/url`.
//! The client never retries; a failed status check only consumes a poll
//! attempt.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use partbridge_core::config::ConversionConfig;
use partbridge_core::error::{AppError, ErrorKind};
use partbridge_core::result::AppResult;

use crate::cancel::or_cancelled;
use crate::error::ConversionError;
use crate::models::{Job, JobDescription, JobEnvelope, JobStatus, UploadForm};
use crate::poll::PollPolicy;

/// Client for creating, feeding, and watching conversion jobs.
#[derive(Debug, Clone)]
pub struct JobClient {
    http: Client,
    base_url: String,
    api_key: String,
    poll: PollPolicy,
}

impl JobClient {
    /// Build a client from the conversion settings.
    pub fn new(config: &ConversionConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            poll: PollPolicy::from_config(config),
        })
    }

    /// Whether an API credential is present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The polling policy used by [`Self::await_completion`].
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Create a preview job and return it with the upload target of its
    /// import task.
    #[instrument(skip(self, cancel))]
    pub async fn create_job(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(Job, UploadForm), ConversionError> {
        let failed = |reason: String| ConversionError::JobCreationFailed { reason };

        let request = self
            .http
            .post(format!("{}/jobs", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&JobDescription::preview())
            .send();
        let response = or_cancelled(cancel, request)
            .await?
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        let body = or_cancelled(cancel, response.text())
            .await?
            .map_err(|e| failed(e.to_string()))?;
        debug!(status = status.as_u16(), "Job creation response");

        if !status.is_success() {
            return Err(failed(if body.is_empty() {
                status.to_string()
            } else {
                body
            }));
        }

        let job = serde_json::from_str::<JobEnvelope>(&body)
            .map_err(|e| failed(format!("invalid job response: {e}")))?
            .data;

        let form = job
            .upload_target()
            .cloned()
            .ok_or_else(|| failed("Upload task not found in response".to_string()))?;

        info!(job_id = %job.id, "Conversion job created");
        Ok((job, form))
    }

    /// Submit the source file to the import task's upload form.
    ///
    /// The form's own fields go first, then the file part named `file`.
    #[instrument(skip(self, form, data, cancel), fields(size = data.len()))]
    pub async fn upload_input(
        &self,
        form: &UploadForm,
        file_name: &str,
        data: Bytes,
        cancel: &CancellationToken,
    ) -> Result<(), ConversionError> {
        let multipart = form
            .fields()
            .fold(Form::new(), |acc, (key, value)| {
                acc.text(key.to_string(), value)
            })
            .part("file", Part::bytes(data.to_vec()).file_name(file_name.to_string()));

        let request = self.http.post(&form.url).multipart(multipart).send();
        let response = or_cancelled(cancel, request)
            .await?
            .map_err(|e| ConversionError::UploadFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Source upload rejected");
            return Err(ConversionError::UploadFailed {
                reason: status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.as_u16().to_string()),
            });
        }

        debug!("Source uploaded");
        Ok(())
    }

    /// Fetch the current state of a job.
    pub async fn fetch_status(&self, job_id: &str) -> Result<Job, String> {
        let response = self
            .http
            .get(format!("{}/jobs/{job_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        response
            .json::<JobEnvelope>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| e.to_string())
    }

    /// Poll `job` until it finishes, fails, or exhausts the attempt ceiling.
    #[instrument(skip(self, job, cancel), fields(job_id = %job.id))]
    pub async fn await_completion(
        &self,
        job: Job,
        cancel: &CancellationToken,
    ) -> Result<Job, ConversionError> {
        let job_id = job.id.clone();
        let job_id = job_id.as_str();

        let polled = self
            .poll
            .run(job, cancel, move |attempt| async move {
                match self.fetch_status(job_id).await {
                    Ok(job) => Some(job),
                    Err(reason) => {
                        warn!(attempt, reason = %reason, "Status check failed");
                        None
                    }
                }
            })
            .await?;

        match polled.job.status {
            JobStatus::Finished => {
                info!(attempts = polled.attempts, "Conversion job finished");
                Ok(polled.job)
            }
            JobStatus::Error => Err(ConversionError::ConversionFailed {
                message: polled
                    .job
                    .first_task_error()
                    .unwrap_or("Unknown error")
                    .to_string(),
            }),
            _ => Err(ConversionError::ConversionTimedOut {
                attempts: polled.attempts,
            }),
        }
    }

    /// Download the exported raster of a finished job.
    #[instrument(skip(self, job, cancel), fields(job_id = %job.id))]
    pub async fn fetch_output(
        &self,
        job: &Job,
        cancel: &CancellationToken,
    ) -> Result<Bytes, ConversionError> {
        let url = job.export_url().ok_or(ConversionError::NoOutputProduced)?;
        let failed = |reason: String| ConversionError::OutputDownloadFailed { reason };

        let response = or_cancelled(cancel, self.http.get(url).send())
            .await?
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status.as_u16())));
        }

        let data = or_cancelled(cancel, response.bytes())
            .await?
            .map_err(|e| failed(e.to_string()))?;
        debug!(size = data.len(), "Converted output downloaded");
        Ok(data)
    }
}
