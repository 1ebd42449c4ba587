//! Builds the configured object store.

use std::sync::Arc;

use partbridge_core::config::{StorageConfig, StorageProviderKind};
use partbridge_core::result::AppResult;
use partbridge_core::traits::storage::ObjectStore;

use crate::providers::{LocalObjectStore, SupabaseObjectStore};

/// Create the object store selected by `config.provider`.
pub async fn build_object_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.provider {
        StorageProviderKind::Local => {
            Arc::new(LocalObjectStore::new(&config.local.root_path).await?)
        }
        StorageProviderKind::Supabase => Arc::new(SupabaseObjectStore::new(&config.supabase)?),
    };

    tracing::info!(
        provider = store.provider_type(),
        bucket = %config.bucket,
        "Object store initialized"
    );
    Ok(store)
}
