//! Caller-driven retry with exponential backoff.
//!
//! A source never retries on its own. This module is the explicit opt-in: it
//! issues a fresh [`AsyncFetchSource::fetch`] per attempt.
//!
//! # Retry Policy
//!
//! - Max retries: 2 (3 total attempts)
//! - Initial delay: 500ms
//! - Max delay: 8 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//!
//! # Retryable Conditions
//!
//! - `SimulatedFailure` only. `Cancelled` and `Timeout` end the loop.
//!
//! # Seeds
//!
//! A seeded config would fail identically on every attempt, so attempt `n`
//! runs with `seed + n` (wrapping). The whole run stays reproducible.

use std::time::Duration;

use tokio::time::sleep;

use mockfetch_types::{ConfigError, FetchConfig, FetchError, FetchResult};

use crate::AsyncFetchSource;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the initial fetch).
    pub max_retries: u32,
    /// Initial backoff delay before first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
    /// Per-attempt deadline. An attempt that misses it ends with `Timeout`.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
            attempt_timeout: None,
        }
    }
}

/// Calculate retry delay with exponential backoff and jitter.
///
/// - `backoff_step`: 0 before first retry, 1 before second, etc.
/// - `jitter_factor` is clamped to [0, 1]; NaN counts as no jitter.
#[must_use]
pub fn calculate_retry_delay(backoff_step: u32, config: &RetryConfig) -> Duration {
    // Exponential backoff: initial_delay * 2^backoff_step
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Down-jitter: multiply by random factor in [1 - jitter_factor, 1.0]
    let jitter = 1.0 - rand::random::<f64>() * effective_jitter(config.jitter_factor);
    Duration::try_from_secs_f64(capped * jitter).unwrap_or(config.max_delay)
}

/// `jitter_factor` as actually applied: within [0, 1], NaN treated as 0.
#[must_use]
pub fn effective_jitter(jitter_factor: f64) -> f64 {
    if jitter_factor.is_nan() {
        0.0
    } else {
        jitter_factor.clamp(0.0, 1.0)
    }
}

/// The config used for attempt `attempt` (0-based) of a retried fetch.
#[must_use]
pub fn attempt_config(base: &FetchConfig, attempt: u32) -> FetchConfig {
    FetchConfig {
        seed: base.seed.map(|seed| seed.wrapping_add(u64::from(attempt))),
        ..*base
    }
}

/// Outcome of a retried fetch.
///
/// Like a single fetch outcome, but records how many attempts were made and
/// why the loop stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// An attempt resolved.
    Success { result: FetchResult, attempts: u32 },
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, source: FetchError },
    /// An attempt failed with an error a new fetch would not fix.
    NonRetryable { attempts: u32, source: FetchError },
}

impl RetryOutcome {
    /// Collapse into the plain fetch outcome.
    pub fn into_result(self) -> Result<FetchResult, FetchError> {
        match self {
            Self::Success { result, .. } => Ok(result),
            Self::Exhausted { source, .. } | Self::NonRetryable { source, .. } => Err(source),
        }
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::NonRetryable { attempts, .. } => *attempts,
        }
    }

    /// Returns true if an attempt resolved.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Fetch with automatic retries on simulated failure.
///
/// An invalid `config` fails before the first attempt.
pub async fn fetch_with_retry(
    source: &AsyncFetchSource,
    config: &FetchConfig,
    retry: &RetryConfig,
) -> Result<RetryOutcome, ConfigError> {
    config.validate()?;

    let mut attempt = 0;
    loop {
        let mut handle = source.fetch(&attempt_config(config, attempt))?;
        let outcome = match retry.attempt_timeout {
            Some(limit) => handle.outcome_within(limit).await,
            None => handle.outcome().await,
        };
        let attempts = attempt + 1;

        let error = match outcome {
            Ok(result) => return Ok(RetryOutcome::Success { result, attempts }),
            Err(error) => error,
        };

        if !error.is_retryable() {
            return Ok(RetryOutcome::NonRetryable {
                attempts,
                source: error,
            });
        }
        if attempt >= retry.max_retries {
            return Ok(RetryOutcome::Exhausted {
                attempts,
                source: error,
            });
        }

        let delay = calculate_retry_delay(attempt, retry);
        tracing::debug!(
            request_id = %handle.id(),
            error = %error,
            retry_count = attempts,
            delay_ms = delay.as_millis(),
            "Retrying fetch after failure"
        );
        sleep(delay).await;
        attempt += 1;
    }
}
