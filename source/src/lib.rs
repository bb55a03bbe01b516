//! Asynchronous fetch source with simulated latency, seedable failure, and
//! cooperative cancellation.
//!
//! # Lifecycle
//!
//! ```text
//! fetch(config) -> FetchHandle (Pending)
//!                      |
//!        +-------------+--------------+
//!        |             |              |
//!   timer fires    cancel()    outcome_within() deadline
//!        |             |              |
//!  Resolved/Rejected  Cancelled   Cancelled (Timeout)
//! ```
//!
//! Each request transitions out of `Pending` exactly once; see [`FetchHandle`].
//! Retrying is the caller's decision and lives in [`retry`].

mod handle;
pub mod retry;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::distr::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use tokio::time::sleep;

pub use handle::{FetchCanceller, FetchHandle};
pub use mockfetch_types::{
    ConfigError, FetchConfig, FetchError, FetchOutcome, FetchResult, FetchStatus, Record,
    RequestId,
};

use handle::{Completion, RequestCell};

/// A data source that answers each fetch after a delay, either with its fixed
/// record set or with a simulated failure.
///
/// Requests are independent: each handle owns its own status cell and the
/// source only hands out ids.
#[derive(Debug)]
pub struct AsyncFetchSource {
    records: Arc<FetchResult>,
    next_id: AtomicU64,
}

impl Default for AsyncFetchSource {
    fn default() -> Self {
        Self::new(FetchResult::sample_users())
    }
}

impl AsyncFetchSource {
    #[must_use]
    pub fn new(records: FetchResult) -> Self {
        Self {
            records: Arc::new(records),
            next_id: AtomicU64::new(1),
        }
    }

    /// The records every successful fetch delivers.
    #[must_use]
    pub fn records(&self) -> &FetchResult {
        &self.records
    }

    /// Start a fetch.
    ///
    /// Fails synchronously with [`ConfigError`] before anything is scheduled.
    /// Otherwise exactly one completion is scheduled on the current Tokio
    /// runtime. Cancelling the request aborts that completion.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the completion is
    /// spawned with [`tokio::spawn`].
    pub fn fetch(&self, config: &FetchConfig) -> Result<FetchHandle, ConfigError> {
        let delay = config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let failure_probability = config.failure_probability;

        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (cell, reply) = RequestCell::new(id);

        tracing::debug!(
            request_id = %id,
            delay_ms = delay.as_millis(),
            failure_probability,
            seed,
            seeded = config.seed.is_some(),
            "Fetch scheduled"
        );

        let completion = Completion::new(Arc::clone(&cell));
        let records = Arc::clone(&self.records);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            if completion.is_finished() {
                return;
            }
            if draws_failure(seed, failure_probability) {
                completion.reject();
            } else {
                completion.resolve(FetchResult::clone(&records));
            }
        });
        cell.attach_task(task.abort_handle());

        Ok(FetchHandle::new(cell, reply))
    }
}

/// Decide success or failure for one request.
///
/// Pure in `seed`, so the same seed and probability always decide the same way.
/// `failure_probability` has already been validated to lie in [0, 1].
#[must_use]
pub fn draws_failure(seed: u64, failure_probability: f64) -> bool {
    let mut rng = StdRng::seed_from_u64(seed);
    Bernoulli::new(failure_probability).is_ok_and(|coin| coin.sample(&mut rng))
}
