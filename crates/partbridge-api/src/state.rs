//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use partbridge_converter::{ConversionMetrics, ConversionProcessor};
use partbridge_core::config::AppConfig;

/// Shared application state, cloned into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Conversion pipeline.
    pub processor: Arc<ConversionProcessor>,
    /// Conversion metrics, shared with the processor.
    pub metrics: Arc<ConversionMetrics>,
    /// Root cancellation token, cancelled when the server shuts down.
    pub shutdown: CancellationToken,
    /// Server start time.
    pub started_at: Instant,
}

impl AppState {
    /// Create the state around a configured processor.
    pub fn new(config: AppConfig, processor: ConversionProcessor, shutdown: CancellationToken) -> Self {
        let metrics = processor.metrics();
        Self {
            config: Arc::new(config),
            processor: Arc::new(processor),
            metrics,
            shutdown,
            started_at: Instant::now(),
        }
    }
}
