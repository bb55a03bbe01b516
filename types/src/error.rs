use thiserror::Error;

/// Why a fetch outcome carries no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FetchError {
    /// The probabilistic failure path.
    #[error("failed to fetch data")]
    SimulatedFailure,
    #[error("fetch was cancelled before completion")]
    Cancelled,
    /// The caller's deadline passed while the request was still pending.
    #[error("fetch did not complete before the caller's deadline")]
    Timeout,
}

impl FetchError {
    /// Whether issuing a fresh fetch could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::SimulatedFailure)
    }
}

/// A [`crate::FetchConfig`] that cannot start a request.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("delay_ms must be non-negative, got {0}")]
    NegativeDelay(i64),
    #[error("failure_probability must be within [0, 1], got {0}")]
    FailureProbabilityOutOfRange(f64),
}
