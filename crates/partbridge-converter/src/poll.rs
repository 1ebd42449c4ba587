//! Job status polling policy.
//!
//! The policy owns the timing (interval, growth, attempt ceiling) and the
//! terminal-state predicate; the job client only supplies how to fetch the
//! next status.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use partbridge_core::config::{ConversionConfig, PollBackoffKind};

use crate::cancel::or_cancelled;
use crate::error::ConversionError;
use crate::models::{Job, JobStatus};

/// Delay growth between status checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every check.
    Fixed,
    /// Delay multiplied by `multiplier` after each check, capped at `max_interval`.
    Exponential {
        /// Growth factor (≥ 1).
        multiplier: f64,
        /// Upper bound for a single delay.
        max_interval: Duration,
    },
}

/// When and how often to check a job's status.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the first check.
    pub interval: Duration,
    /// Maximum number of checks.
    pub max_attempts: u32,
    /// Delay growth.
    pub backoff: Backoff,
}

/// Where polling stopped.
#[derive(Debug, Clone)]
pub struct Polled {
    /// Last observed job state.
    pub job: Job,
    /// Number of status checks performed.
    pub attempts: u32,
}

impl Default for PollPolicy {
    /// One check per second, at most 60 checks.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
            backoff: Backoff::Fixed,
        }
    }
}

impl PollPolicy {
    /// Build the policy from the conversion settings.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let backoff = match config.poll_backoff {
            PollBackoffKind::Fixed => Backoff::Fixed,
            PollBackoffKind::Exponential => Backoff::Exponential {
                multiplier: config.backoff_multiplier.max(1.0),
                max_interval: Duration::from_millis(config.max_poll_interval_ms),
            },
        };
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_poll_attempts,
            backoff,
        }
    }

    /// Whether `status` ends polling.
    pub fn is_terminal(&self, status: JobStatus) -> bool {
        status.is_terminal()
    }

    /// Whether another check should be made after `attempts` checks.
    pub fn should_continue(&self, status: JobStatus, attempts: u32) -> bool {
        !self.is_terminal(status) && attempts < self.max_attempts
    }

    /// Delay before check number `attempt` (zero-based).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential {
                multiplier,
                max_interval,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let secs = self.interval.as_secs_f64() * multiplier.powi(exponent);
                Duration::try_from_secs_f64(secs.min(max_interval.as_secs_f64()))
                    .unwrap_or(max_interval)
            }
        }
    }

    /// Poll until the job is terminal or the attempt ceiling is reached.
    ///
    /// `check` receives the 1-based attempt number and returns the latest
    /// job state, or `None` when that check failed; a failed check still
    /// consumes an attempt. A job that is already terminal is returned
    /// without any check.
    pub async fn run<F, Fut>(
        &self,
        initial: Job,
        cancel: &CancellationToken,
        mut check: F,
    ) -> Result<Polled, ConversionError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<Job>>,
    {
        let mut job = initial;
        let mut attempts = 0u32;

        while self.should_continue(job.status, attempts) {
            or_cancelled(cancel, tokio::time::sleep(self.delay_before(attempts))).await?;

            attempts += 1;
            if let Some(latest) = or_cancelled(cancel, check(attempts)).await? {
                job = latest;
            }
            debug!(job_id = %job.id, status = ?job.status, attempt = attempts, "Job status");
        }

        Ok(Polled { job, attempts })
    }
}
