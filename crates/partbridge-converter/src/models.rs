//! Data models for the pipeline and the conversion job API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use partbridge_core::types::ProjectId;

use crate::error::ConversionError;

/// Name of the task that accepts the source upload.
pub const IMPORT_TASK: &str = "import-file";
/// Name of the task that rasterizes the source.
pub const CONVERT_TASK: &str = "convert-file";
/// Name of the task that publishes the raster at a download URL.
pub const EXPORT_TASK: &str = "export-file";
/// Raster format requested from the convert task.
pub const PREVIEW_FORMAT: &str = "png";
/// Content type recorded for published previews.
pub const PREVIEW_CONTENT_TYPE: &str = "image/png";

/// One conversion invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Project whose preview is being generated.
    pub project_id: ProjectId,
    /// Source file reference as stored by the uploader (key, path, or URL).
    pub source_ref: String,
}

/// A preview that was uploaded and linked to its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPreview {
    /// Bucket-relative key of the preview image.
    pub storage_key: String,
    /// Size of the published image in bytes.
    pub size_bytes: u64,
}

/// The single value a conversion hands back to its caller.
pub type ConversionOutcome = Result<PublishedPreview, ConversionError>;

/// Job-level status reported by the conversion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet scheduled.
    Created,
    /// Waiting for input (e.g. the upload).
    Waiting,
    /// Running.
    Processing,
    /// All tasks completed.
    Finished,
    /// At least one task failed.
    Error,
    /// A status this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether no further transitions will occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }
}

/// Task-level status. Same vocabulary as [`JobStatus`].
pub type TaskStatus = JobStatus;

/// A conversion job as returned by `POST /jobs` and `GET /jobs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: String,
    /// Job-level status.
    pub status: JobStatus,
    /// Tasks belonging to the job.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Job {
    /// Find a task by its name in the job description.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Message of the first failed task that carries one.
    pub fn first_task_error(&self) -> Option<&str> {
        self.tasks
            .iter()
            .filter(|t| t.status == JobStatus::Error)
            .find_map(|t| t.message.as_deref().filter(|m| !m.is_empty()))
    }

    /// Upload form returned by the import task.
    pub fn upload_target(&self) -> Option<&UploadForm> {
        self.task(IMPORT_TASK)?.result.as_ref()?.form.as_ref()
    }

    /// Download URL of the first exported file.
    pub fn export_url(&self) -> Option<&str> {
        self.task(EXPORT_TASK)?
            .result
            .as_ref()?
            .files
            .as_ref()?
            .first()?
            .url
            .as_deref()
    }
}

/// One task in a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Name given in the job description.
    pub name: String,
    /// Operation, e.g. `import/upload`.
    #[serde(default)]
    pub operation: Option<String>,
    /// Task-level status.
    pub status: TaskStatus,
    /// Failure message, present on failed tasks.
    #[serde(default)]
    pub message: Option<String>,
    /// Operation-specific result payload.
    #[serde(default)]
    pub result: Option<TaskResult>,
}

/// Result payload of a task. Import tasks fill `form`, export tasks `files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskResult {
    /// Upload form for `import/upload`.
    #[serde(default)]
    pub form: Option<UploadForm>,
    /// Exported files for `export/url`.
    #[serde(default)]
    pub files: Option<Vec<ExportedFile>>,
}

/// Where and how to upload the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadForm {
    /// Form action URL.
    pub url: String,
    /// Fields that must precede the file part. Key order is significant:
    /// signed upload targets expect them exactly as issued.
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
}

impl UploadForm {
    /// Form fields as text, in the order they were received.
    pub fn fields(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.parameters.iter().map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.as_str(), text)
        })
    }
}

/// A file produced by an export task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedFile {
    /// Output filename.
    #[serde(default)]
    pub filename: Option<String>,
    /// Temporary download URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// `{ "data": ... }` wrapper used by every job API response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEnvelope {
    /// The job.
    pub data: Job,
}

/// Request body for `POST /jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct JobDescription {
    /// Tasks keyed by name.
    pub tasks: BTreeMap<&'static str, TaskSpec>,
}

/// One task in a job description.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSpec {
    /// Operation name.
    pub operation: &'static str,
    /// Name of the task whose output feeds this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<&'static str>,
    /// Target format for `convert`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<&'static str>,
}

impl JobDescription {
    /// Upload → rasterize → export-to-URL.
    pub fn preview() -> Self {
        let mut tasks = BTreeMap::new();
        tasks.insert(
            IMPORT_TASK,
            TaskSpec {
                operation: "import/upload",
                input: None,
                output_format: None,
            },
        );
        tasks.insert(
            CONVERT_TASK,
            TaskSpec {
                operation: "convert",
                input: Some(IMPORT_TASK),
                output_format: Some(PREVIEW_FORMAT),
            },
        );
        tasks.insert(
            EXPORT_TASK,
            TaskSpec {
                operation: "export/url",
                input: Some(CONVERT_TASK),
                output_format: None,
            },
        );
        Self { tasks }
    }
}
