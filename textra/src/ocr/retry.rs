use std::time::Duration;

use crate::config::OcrConfig;

/// Backoff curve for provider calls: a fixed number of attempts with delays
/// that start at `initial_delay`, double after each failure, and never
/// exceed `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Delay to wait after the given failure count (1-based).
    fn delay_after(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// What the caller should do after an attempt fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Tracks attempts across one logical extraction. Drives the loop in
/// [`super::VisionClient`]: call [`RetrySchedule::on_failure`] after each
/// failed attempt and either sleep for the returned delay or surface the
/// last error.
#[derive(Debug)]
pub struct RetrySchedule {
    policy: RetryPolicy,
    failures: u32,
}

impl RetrySchedule {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            failures: 0,
        }
    }

    /// Records a failed attempt and decides whether another one is allowed.
    pub fn on_failure(&mut self) -> RetryDecision {
        self.failures += 1;
        if self.failures >= self.policy.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.policy.delay_after(self.failures))
        }
    }

    /// Attempts made so far, counting the initial one.
    pub fn attempts(&self) -> u32 {
        self.failures
    }
}
