//! Retry policy for draft saves.
//!
//! A failed save is retried a bounded number of times with a growing delay
//! before the error reaches the user. The policy is injected into the draft
//! manager so tests can run it without real sleeps.

use std::time::Duration;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// No delay between attempts.
    None,
    /// `step * n` before retry `n` (2s, 4s, ... for a 2s step).
    Linear { step: Duration },
    /// `initial * 2^(n-1)`, clamped to `max`.
    Exponential { initial: Duration, max: Duration },
}

/// Tunable retry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    pub backoff: Backoff,
}

/// Default retries for a failed save.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default linear backoff step.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(2);

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Backoff::Linear {
                step: DEFAULT_BACKOFF_STEP,
            },
        }
    }
}

impl RetryPolicy {
    /// Retry `max_retries` times without waiting.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
        }
    }

    /// Never retry.
    pub fn no_retry() -> Self {
        Self::immediate(0)
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Linear { step } => step.saturating_mul(retry),
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}
