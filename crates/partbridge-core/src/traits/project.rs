//! Project record store trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::ProjectId;

/// Writes preview references onto project records owned by the marketplace.
///
/// Only the preview column is touched; the rest of the record belongs to
/// other parts of the application.
#[async_trait]
pub trait ProjectRecordStore: Send + Sync + std::fmt::Debug + 'static {
    /// Point the project's preview at `preview_key`.
    async fn set_preview_key(&self, project_id: &ProjectId, preview_key: &str) -> AppResult<()>;

    /// Check whether the backing database answers.
    async fn health_check(&self) -> AppResult<bool>;
}
