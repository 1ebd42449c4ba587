//! Project-record database configuration.

use serde::{Deserialize, Serialize};

/// PostgreSQL connection pool configuration.
///
/// The hosted backend exposes the project table over a plain Postgres
/// connection; only the preview column of that table is ever written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Table holding project records.
    #[serde(default = "default_projects_table")]
    pub projects_table: String,
    /// Column receiving the preview storage key.
    #[serde(default = "default_preview_column")]
    pub preview_column: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            projects_table: default_projects_table(),
            preview_column: default_preview_column(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_projects_table() -> String {
    "projects".to_string()
}

fn default_preview_column() -> String {
    "preview_url".to_string()
}
