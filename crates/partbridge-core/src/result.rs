//! Convenience result type alias for PartBridge.

use crate::error::AppError;

/// A specialized `Result` type for PartBridge operations.
pub type AppResult<T> = Result<T, AppError>;
