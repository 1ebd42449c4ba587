//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use partbridge_converter::ConversionRequest;
use partbridge_core::types::ProjectId;

/// Body of `POST /convert-cad`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// Project whose preview should be generated.
    #[validate(length(min = 1, message = "projectId is required"))]
    pub project_id: String,
    /// Source file reference: a bucket key, a prefixed storage path, or a
    /// public object URL.
    #[validate(length(min = 1, message = "fileName is required"))]
    pub file_name: String,
}

impl From<ConvertRequest> for ConversionRequest {
    fn from(body: ConvertRequest) -> Self {
        Self {
            project_id: ProjectId::new(body.project_id),
            source_ref: body.file_name,
        }
    }
}
