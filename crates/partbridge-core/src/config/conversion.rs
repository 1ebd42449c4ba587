//! Conversion service configuration.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// How the delay between job status checks evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollBackoffKind {
    /// Same interval before every check.
    #[default]
    Fixed,
    /// Interval grows by `backoff_multiplier`, capped at `max_poll_interval_ms`.
    Exponential,
}

/// Settings for the external file-conversion job API.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Base URL of the job API.
    #[serde(default = "default_api_base_url")]
    #[validate(url)]
    pub api_base_url: String,

    /// Bearer credential for the job API. Blank means "not configured";
    /// conversion requests then fail before any external call.
    #[serde(default)]
    pub api_key: String,

    /// Delay before each status check, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 1))]
    pub poll_interval_ms: u64,

    /// Ceiling on status checks before the job is declared timed out.
    #[serde(default = "default_max_poll_attempts")]
    #[validate(range(min = 1, max = 3600))]
    pub max_poll_attempts: u32,

    /// Delay growth strategy between status checks.
    #[serde(default)]
    pub poll_backoff: PollBackoffKind,

    /// Growth factor for exponential backoff.
    #[serde(default = "default_backoff_multiplier")]
    #[validate(range(min = 1.0, max = 10.0))]
    pub backoff_multiplier: f64,

    /// Upper bound on a single exponential delay, in milliseconds.
    #[serde(default = "default_max_poll_interval_ms")]
    #[validate(range(min = 1))]
    pub max_poll_interval_ms: u64,

    /// Per-request timeout for calls to the job API and its upload/download URLs.
    #[serde(default = "default_request_timeout_seconds")]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_seconds: u64,

    /// Key prefix under which previews are published. Leading and trailing
    /// slashes are ignored.
    #[serde(default = "default_preview_prefix")]
    #[validate(custom(function = "validate_preview_prefix"))]
    pub preview_prefix: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            poll_backoff: PollBackoffKind::default(),
            backoff_multiplier: default_backoff_multiplier(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
            request_timeout_seconds: default_request_timeout_seconds(),
            preview_prefix: default_preview_prefix(),
        }
    }
}

impl ConversionConfig {
    /// Whether an API credential has been supplied.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

fn validate_preview_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.trim_matches('/').is_empty() {
        return Err(ValidationError::new("preview_prefix")
            .with_message("preview prefix must contain more than slashes".into()));
    }
    Ok(())
}

fn default_api_base_url() -> String {
    "https://api.cloudconvert.com/v2".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_poll_interval_ms() -> u64 {
    10_000
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_preview_prefix() -> String {
    "previews".to_string()
}
