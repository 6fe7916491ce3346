//! Draft lifecycle settings read from the environment.

use std::str::FromStr;
use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy, DEFAULT_BACKOFF_STEP, DEFAULT_MAX_RETRIES};

/// Default autosave period.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound for `SAVE_MAX_RETRIES`.
pub const MAX_SAVE_RETRIES: u32 = 10;

/// Draft lifecycle configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftConfig {
    /// How often the autosave loop checks for unsaved edits.
    pub autosave_interval: Duration,
    /// Retry policy for failed saves.
    pub retry: RetryPolicy,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }
}

impl DraftConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `AUTOSAVE_INTERVAL_SECS` | `30`    |
    /// | `SAVE_MAX_RETRIES`       | `2`     |
    /// | `SAVE_BACKOFF_STEP_MS`   | `2000`  |
    /// | `SAVE_BACKOFF_MAX_MS`    | unset   |
    ///
    /// Setting `SAVE_BACKOFF_MAX_MS` switches from linear to exponential
    /// backoff starting at the step and capped at that value. Retries are
    /// capped at [`MAX_SAVE_RETRIES`]. Unparseable values fall back to the
    /// default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let interval_secs: u64 = parse_or(
            &lookup,
            "AUTOSAVE_INTERVAL_SECS",
            DEFAULT_AUTOSAVE_INTERVAL.as_secs(),
        );
        let mut max_retries: u32 = parse_or(&lookup, "SAVE_MAX_RETRIES", DEFAULT_MAX_RETRIES);
        if max_retries > MAX_SAVE_RETRIES {
            tracing::warn!(value = max_retries, max = MAX_SAVE_RETRIES, "SAVE_MAX_RETRIES too large, clamping");
            max_retries = MAX_SAVE_RETRIES;
        }
        let step_ms: u64 = parse_or(
            &lookup,
            "SAVE_BACKOFF_STEP_MS",
            DEFAULT_BACKOFF_STEP.as_millis() as u64,
        );
        let step = Duration::from_millis(step_ms);
        let backoff = match lookup("SAVE_BACKOFF_MAX_MS") {
            None => Backoff::Linear { step },
            Some(_) => {
                let max_ms: u64 = parse_or(&lookup, "SAVE_BACKOFF_MAX_MS", step_ms);
                Backoff::Exponential {
                    initial: step,
                    max: Duration::from_millis(max_ms.max(step_ms)),
                }
            }
        };

        Self {
            // A zero period would make `tokio::time::interval` panic.
            autosave_interval: Duration::from_secs(interval_secs.max(1)),
            retry: RetryPolicy {
                max_retries,
                backoff,
            },
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, default = %default, "Invalid config value, using default");
                default
            }
        },
    }
}
