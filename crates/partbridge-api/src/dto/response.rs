//! Response DTOs.

use serde::{Deserialize, Serialize};

use partbridge_converter::MetricsSnapshot;

/// Successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Always `true`.
    pub success: bool,
    /// Bucket key of the published preview.
    pub preview_url: String,
}

impl ConvertResponse {
    /// Success response for a published preview key.
    pub fn ok(preview_url: impl Into<String>) -> Self {
        Self {
            success: true,
            preview_url: preview_url.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when a credential is missing or a backend is down.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Object store backend in use.
    pub storage_provider: String,
    /// Missing credential, when `status` is `degraded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_configuration: Option<String>,
    /// Backends that failed their health check.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unreachable: Vec<String>,
    /// Conversion counters and durations.
    pub metrics: MetricsSnapshot,
}
