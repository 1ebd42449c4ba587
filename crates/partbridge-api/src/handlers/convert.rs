//! Conversion endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::info;
use validator::Validate;

use partbridge_core::error::AppError;

use crate::dto::request::ConvertRequest;
use crate::dto::response::ConvertResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /convert-cad
///
/// Converts the referenced CAD file into a PNG preview, publishes it, and
/// links it to the project. Malformed bodies are reported with the same
/// `{ "error": ... }` shape as pipeline failures.
pub async fn convert_cad(
    State(state): State<AppState>,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    body.validate()
        .map_err(|e| AppError::validation(validation_message(&e)))?;

    info!(project_id = %body.project_id, file_name = %body.file_name, "Conversion requested");

    let preview = state
        .processor
        .convert(body.into(), state.shutdown.child_token())
        .await?;

    Ok(Json(ConvertResponse::ok(preview.storage_key)))
}

/// First field message, falling back to the validator's own rendering.
fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
