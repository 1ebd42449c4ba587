//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and environment variables. Each sub-module represents a
//! logical configuration section.

pub mod app;
pub mod conversion;
pub mod database;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::app::{CorsConfig, ServerConfig};
pub use self::conversion::{ConversionConfig, PollBackoffKind};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::storage::{
    LocalStorageConfig, StorageConfig, StorageProviderKind, SupabaseStorageConfig,
};

use crate::error::AppError;

/// Environment variables set by the hosting platform, mapped onto config keys.
const PLATFORM_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CLOUDCONVERT_API_KEY", "conversion.api_key"),
    ("SUPABASE_URL", "storage.supabase.url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "storage.supabase.service_key"),
    ("DATABASE_URL", "database.url"),
];

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Object store settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Project-record database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Conversion job API settings.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default.toml`, an environment-specific overlay
    /// `config/{env}.toml`, variables prefixed with `PARTBRIDGE__`, and
    /// finally the platform variables in [`PLATFORM_ENV_OVERRIDES`].
    pub fn load(env: &str) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PARTBRIDGE")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in PLATFORM_ENV_OVERRIDES {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        let config: Self = builder
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges. Missing credentials are not an error here; they
    /// are reported per request so the server can still answer health checks.
    pub fn validate(&self) -> Result<(), AppError> {
        self.conversion
            .validate()
            .map_err(|e| AppError::configuration(format!("Invalid conversion config: {e}")))
    }
}
