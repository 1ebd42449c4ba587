//! Project repository: writes preview keys onto project records.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use partbridge_core::config::DatabaseConfig;
use partbridge_core::error::{AppError, ErrorKind};
use partbridge_core::result::AppResult;
use partbridge_core::traits::project::ProjectRecordStore;
use partbridge_core::types::ProjectId;

/// Repository for the preview column of the projects table.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: PgPool,
    /// Prepared `UPDATE` statement with the configured table and column.
    update_sql: String,
}

impl ProjectRepository {
    /// Create a new project repository.
    ///
    /// Table and column names come from configuration and are interpolated
    /// into SQL, so they are restricted to plain identifiers.
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> AppResult<Self> {
        let table = checked_identifier(&config.projects_table)?;
        let column = checked_identifier(&config.preview_column)?;

        // The id column type varies between deployments (uuid or text);
        // comparing as text accepts both.
        let update_sql = format!("UPDATE {table} SET {column} = $1 WHERE id::text = $2");

        Ok(Self { pool, update_sql })
    }
}

#[async_trait]
impl ProjectRecordStore for ProjectRepository {
    async fn set_preview_key(&self, project_id: &ProjectId, preview_key: &str) -> AppResult<()> {
        let result = sqlx::query(&self.update_sql)
            .bind(preview_key)
            .bind(project_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, e.to_string(), e))?;

        if result.rows_affected() == 0 {
            warn!(
                project_id = %project_id,
                preview_key,
                "No project row matched preview update"
            );
        } else {
            debug!(project_id = %project_id, preview_key, "Project preview updated");
        }

        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}

/// Accept `name` or `schema.name` made of ASCII alphanumerics and underscores.
fn checked_identifier(raw: &str) -> AppResult<&str> {
    let valid = !raw.is_empty()
        && raw.split('.').count() <= 2
        && raw.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(raw)
    } else {
        Err(AppError::configuration(format!(
            "Invalid SQL identifier in database config: '{raw}'"
        )))
    }
}
