//! Error taxonomy for the preview pipeline.
//!
//! Each variant names the step that failed; the display text is what the
//! HTTP caller receives in its `{ "error": ... }` body.

use std::fmt;

use partbridge_core::error::AppError;
use thiserror::Error;

/// Pipeline step, used for logging where a conversion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Checking credentials before any external call.
    Configuration,
    /// Resolving the file reference to a storage key.
    Resolve,
    /// Downloading the source file from the object store.
    Fetch,
    /// Creating the conversion job.
    CreateJob,
    /// Uploading the source file to the job's import task.
    Upload,
    /// Polling the job until it is terminal.
    AwaitCompletion,
    /// Downloading the exported raster.
    FetchOutput,
    /// Uploading the preview into the object store.
    PublishPreview,
    /// Recording the preview key on the project.
    UpdateRecord,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
            Self::CreateJob => "create_job",
            Self::Upload => "upload",
            Self::AwaitCompletion => "await_completion",
            Self::FetchOutput => "fetch_output",
            Self::PublishPreview => "publish_preview",
            Self::UpdateRecord => "update_record",
        };
        f.write_str(name)
    }
}

/// Unified error type for all preview conversion operations.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A required credential is absent; nothing external was attempted.
    #[error("{what}")]
    ConfigurationMissing {
        /// Human-readable name of the missing setting.
        what: &'static str,
    },

    /// The file reference is neither a bare key nor a recognizable public URL.
    #[error("Unrecognized file reference: {reference}")]
    UnrecognizedFileReference {
        /// The reference as received.
        reference: String,
    },

    /// The source file could not be read from the object store.
    #[error("Failed to download file: {reason}")]
    DownloadFailed {
        /// The storage key that was requested.
        path: String,
        /// Store-level failure message.
        reason: String,
    },

    /// The job API rejected the job or returned no usable upload target.
    #[error("CloudConvert job creation failed: {reason}")]
    JobCreationFailed {
        /// Response body or parse failure.
        reason: String,
    },

    /// Submitting the source file to the upload target failed.
    #[error("File upload to CloudConvert failed: {reason}")]
    UploadFailed {
        /// HTTP status text or transport error.
        reason: String,
    },

    /// The job reached its `error` state.
    #[error("CloudConvert conversion failed: {message}")]
    ConversionFailed {
        /// Message of the first failing task, or a generic fallback.
        message: String,
    },

    /// The job was still running when the polling ceiling was reached.
    #[error("CloudConvert conversion timeout after {attempts} status checks")]
    ConversionTimedOut {
        /// Number of status checks performed.
        attempts: u32,
    },

    /// The finished job carries no export URL.
    #[error("No converted file URL found")]
    NoOutputProduced,

    /// The export URL could not be downloaded.
    #[error("Failed to download converted file from CloudConvert: {reason}")]
    OutputDownloadFailed {
        /// HTTP status or transport error.
        reason: String,
    },

    /// The preview could not be written to the object store.
    #[error("Failed to upload preview: {reason}")]
    PreviewUploadFailed {
        /// Key the preview was meant to be written under.
        key: String,
        /// Store-level failure message.
        reason: String,
    },

    /// The preview exists but the project record does not point at it.
    #[error("Failed to update project: {reason}")]
    ProjectRecordUpdateFailed {
        /// Key of the already-published preview.
        key: String,
        /// Database failure message.
        reason: String,
    },

    /// The caller or the server gave up before the pipeline finished.
    #[error("Conversion was cancelled")]
    Cancelled,
}

impl ConversionError {
    /// The step that produced this error. `None` for cancellation, which can
    /// interrupt any step.
    pub fn stage(&self) -> Option<PipelineStage> {
        let stage = match self {
            Self::ConfigurationMissing { .. } => PipelineStage::Configuration,
            Self::UnrecognizedFileReference { .. } => PipelineStage::Resolve,
            Self::DownloadFailed { .. } => PipelineStage::Fetch,
            Self::JobCreationFailed { .. } => PipelineStage::CreateJob,
            Self::UploadFailed { .. } => PipelineStage::Upload,
            Self::ConversionFailed { .. } | Self::ConversionTimedOut { .. } => {
                PipelineStage::AwaitCompletion
            }
            Self::NoOutputProduced | Self::OutputDownloadFailed { .. } => {
                PipelineStage::FetchOutput
            }
            Self::PreviewUploadFailed { .. } => PipelineStage::PublishPreview,
            Self::ProjectRecordUpdateFailed { .. } => PipelineStage::UpdateRecord,
            Self::Cancelled => return None,
        };
        Some(stage)
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        let message = err.to_string();
        match err {
            ConversionError::ConfigurationMissing { .. } => AppError::configuration(message),
            ConversionError::UnrecognizedFileReference { .. } => AppError::validation(message),
            ConversionError::DownloadFailed { .. } | ConversionError::PreviewUploadFailed { .. } => {
                AppError::storage(message)
            }
            ConversionError::ProjectRecordUpdateFailed { .. } => AppError::database(message),
            ConversionError::ConversionTimedOut { .. } => AppError::timeout(message),
            ConversionError::Cancelled => AppError::cancelled(message),
            ConversionError::JobCreationFailed { .. }
            | ConversionError::UploadFailed { .. }
            | ConversionError::ConversionFailed { .. }
            | ConversionError::NoOutputProduced
            | ConversionError::OutputDownloadFailed { .. } => AppError::external_service(message),
        }
    }
}
