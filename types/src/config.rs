use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Parameters for a single fetch.
///
/// Fields are deliberately wide (`i64`, `f64`) so that out-of-range values can be
/// expressed and rejected by [`FetchConfig::validate`] rather than by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Simulated latency before the outcome is decided.
    pub delay_ms: i64,
    /// Probability in [0, 1] that the outcome is `SimulatedFailure`.
    pub failure_probability: f64,
    /// Fixes the success/failure draw. `None` draws a fresh seed per fetch.
    pub seed: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            failure_probability: 0.5,
            seed: None,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub const fn new(delay_ms: i64, failure_probability: f64, seed: Option<u64>) -> Self {
        Self {
            delay_ms,
            failure_probability,
            seed,
        }
    }

    /// Check the config and return the delay it describes.
    pub fn validate(&self) -> Result<Duration, ConfigError> {
        if self.delay_ms < 0 {
            return Err(ConfigError::NegativeDelay(self.delay_ms));
        }
        // NaN fails the range check too.
        if !(0.0..=1.0).contains(&self.failure_probability) {
            return Err(ConfigError::FailureProbabilityOutOfRange(
                self.failure_probability,
            ));
        }
        Ok(Duration::from_millis(self.delay_ms as u64))
    }
}
