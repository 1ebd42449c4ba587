//! Conversion counters and duration percentiles.
//!
//! Counters are atomics; the duration window sits behind a mutex.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::ConversionError;

/// Number of recent durations kept for percentile calculation.
const MAX_DURATION_SAMPLES: usize = 1000;

/// Process-wide conversion metrics.
#[derive(Debug)]
pub struct ConversionMetrics {
    /// Conversions started.
    pub conversions_started: AtomicU64,
    /// Conversions that published a preview.
    pub conversions_succeeded: AtomicU64,
    /// Conversions that failed, timeouts included.
    pub conversions_failed: AtomicU64,
    /// Conversions that hit the polling ceiling.
    pub conversions_timed_out: AtomicU64,
    /// Conversions abandoned through cancellation.
    pub conversions_cancelled: AtomicU64,
    /// Source bytes downloaded.
    pub total_input_bytes: AtomicU64,
    /// Preview bytes published.
    pub total_output_bytes: AtomicU64,
    duration_samples: Mutex<VecDeque<Duration>>,
}

impl ConversionMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            conversions_started: AtomicU64::new(0),
            conversions_succeeded: AtomicU64::new(0),
            conversions_failed: AtomicU64::new(0),
            conversions_timed_out: AtomicU64::new(0),
            conversions_cancelled: AtomicU64::new(0),
            total_input_bytes: AtomicU64::new(0),
            total_output_bytes: AtomicU64::new(0),
            duration_samples: Mutex::new(VecDeque::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    /// Record a conversion start.
    pub fn record_started(&self) {
        self.conversions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a downloaded source file.
    pub fn record_input(&self, bytes: u64) {
        self.total_input_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a published preview.
    pub fn record_success(&self, duration: Duration, output_bytes: u64) {
        self.conversions_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_output_bytes
            .fetch_add(output_bytes, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// Record a failed conversion, classified by its error.
    pub fn record_error(&self, err: &ConversionError) {
        match err {
            ConversionError::Cancelled => {
                self.conversions_cancelled.fetch_add(1, Ordering::Relaxed);
            }
            ConversionError::ConversionTimedOut { .. } => {
                self.conversions_timed_out.fetch_add(1, Ordering::Relaxed);
                self.conversions_failed.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.conversions_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.pop_front();
            }
            samples.push_back(duration);
        }
    }

    /// Current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut durations: Vec<Duration> = self
            .duration_samples
            .lock()
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        durations.sort_unstable();

        MetricsSnapshot {
            conversions_started: self.conversions_started.load(Ordering::Relaxed),
            conversions_succeeded: self.conversions_succeeded.load(Ordering::Relaxed),
            conversions_failed: self.conversions_failed.load(Ordering::Relaxed),
            conversions_timed_out: self.conversions_timed_out.load(Ordering::Relaxed),
            conversions_cancelled: self.conversions_cancelled.load(Ordering::Relaxed),
            total_input_bytes: self.total_input_bytes.load(Ordering::Relaxed),
            total_output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            duration_p50: percentile(&durations, 50),
            duration_p95: percentile(&durations, 95),
            duration_p99: percentile(&durations, 99),
            sample_count: durations.len() as u64,
        }
    }
}

impl Default for ConversionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-rank percentile of an ascending slice.
fn percentile(sorted: &[Duration], pct: usize) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (sorted.len() * pct).div_ceil(100).max(1);
    sorted.get(rank - 1).copied()
}

/// Point-in-time copy of [`ConversionMetrics`], served by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Conversions started.
    pub conversions_started: u64,
    /// Conversions that published a preview.
    pub conversions_succeeded: u64,
    /// Conversions that failed.
    pub conversions_failed: u64,
    /// Conversions that hit the polling ceiling.
    pub conversions_timed_out: u64,
    /// Conversions abandoned through cancellation.
    pub conversions_cancelled: u64,
    /// Source bytes downloaded.
    pub total_input_bytes: u64,
    /// Preview bytes published.
    pub total_output_bytes: u64,
    /// Median duration of successful conversions, in milliseconds.
    #[serde(rename = "duration_p50_ms", serialize_with = "as_millis")]
    pub duration_p50: Option<Duration>,
    /// 95th percentile duration, in milliseconds.
    #[serde(rename = "duration_p95_ms", serialize_with = "as_millis")]
    pub duration_p95: Option<Duration>,
    /// 99th percentile duration, in milliseconds.
    #[serde(rename = "duration_p99_ms", serialize_with = "as_millis")]
    pub duration_p99: Option<Duration>,
    /// Number of duration samples behind the percentiles.
    pub sample_count: u64,
}

fn as_millis<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match duration {
        Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}
