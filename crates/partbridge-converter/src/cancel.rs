//! Cancellation helper shared by the pipeline stages.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::ConversionError;

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn or_cancelled<F>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ConversionError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConversionError::Cancelled),
        out = fut => Ok(out),
    }
}
