//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let missing = state.processor.missing_configuration();
    let unreachable = state.processor.unreachable_backends().await;
    let degraded = missing.is_some() || !unreachable.is_empty();

    Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        storage_provider: state.processor.storage_provider().to_string(),
        missing_configuration: missing.map(str::to_string),
        unreachable,
        metrics: state.metrics.snapshot(),
    })
}
