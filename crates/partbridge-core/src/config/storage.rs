//! Object store configuration.

use serde::{Deserialize, Serialize};

/// Which object store backend serves project files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProviderKind {
    /// Hosted storage REST API (the production backend).
    Supabase,
    /// Local filesystem, one directory per bucket.
    Local,
}

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend used for both the source download and the preview upload.
    #[serde(default = "default_provider")]
    pub provider: StorageProviderKind,
    /// Bucket holding uploaded CAD files and generated previews.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// Hosted storage API configuration.
    #[serde(default)]
    pub supabase: SupabaseStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            bucket: default_bucket(),
            local: LocalStorageConfig::default(),
            supabase: SupabaseStorageConfig::default(),
        }
    }
}

impl StorageConfig {
    /// The substring that precedes the object key in public object URLs
    /// for the configured bucket, e.g. `/object/public/project-files/`.
    pub fn public_url_marker(&self) -> String {
        format!("/object/public/{}/", self.bucket)
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path; each bucket is a subdirectory.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// Hosted storage API configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SupabaseStorageConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// Service-role key used for both `apikey` and bearer auth.
    #[serde(default)]
    pub service_key: String,
}

fn default_provider() -> StorageProviderKind {
    StorageProviderKind::Supabase
}

fn default_bucket() -> String {
    "project-files".to_string()
}

fn default_local_root() -> String {
    "./data/storage".to_string()
}
