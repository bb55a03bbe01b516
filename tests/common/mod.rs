//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tokio::time::sleep;

use mockfetch_source::{AsyncFetchSource, FetchConfig};

/// A source serving the default user records.
pub fn users_source() -> AsyncFetchSource {
    AsyncFetchSource::default()
}

/// Shorthand for a seeded config.
pub fn seeded(delay_ms: i64, failure_probability: f64, seed: u64) -> FetchConfig {
    FetchConfig::new(delay_ms, failure_probability, Some(seed))
}

/// Let paused time run past `ms` so any completion due by then has fired.
pub async fn run_for(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}
