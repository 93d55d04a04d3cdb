//! Retry policy for data-page requests

use super::response::ResponseContainer;
use crate::config::RetryConfig;
use crate::error::{is_retryable_status, Error, Result};
use crate::types::BackoffType;
use std::time::Duration;

/// When and how long to wait before repeating a request
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Delay after the first failure
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build a policy from configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_type: config.backoff_type,
            initial_backoff: Duration::from_millis(config.initial_ms),
            max_backoff: Duration::from_millis(config.max_ms),
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set max attempts
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff_type = backoff_type;
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Delay before the next attempt, given how many attempts already failed
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let step = failed_attempts.saturating_sub(1);
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(step + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(step);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }

    /// Whether the outcome of an attempt warrants another one
    pub fn should_retry(&self, outcome: &Result<ResponseContainer>) -> bool {
        match outcome {
            Ok(response) => is_retryable_status(response.status()),
            Err(Error::Http(e)) => e.is_connect() || e.is_timeout(),
            Err(_) => false,
        }
    }

    /// Whether another attempt is allowed after `attempts` tries
    pub fn has_attempts_left(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}
