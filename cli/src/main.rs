//! mockfetch CLI - drives an [`AsyncFetchSource`] end to end.
//!
//! # Flow
//!
//! ```text
//! main() -> DemoConfig::load() -> AsyncFetchSource::default()
//!              |
//!              v
//!   plain fetch -> cancelled fetch -> retried fetch
//! ```
//!
//! Records go to stdout as JSON. Failures and progress go to the log on
//! stderr (`RUST_LOG`, default `info`).

mod config;

use std::io::{Write, stderr, stdout};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mockfetch_source::retry::{RetryConfig, RetryOutcome, fetch_with_retry};
use mockfetch_source::{AsyncFetchSource, FetchConfig, FetchResult};

use crate::config::DemoConfig;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    // Stdout carries the JSON output, so logs stay on stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(stderr))
        .with(env_filter)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    let mut out = stdout().lock();
    writeln!(out, "{rendered}").context("failed to write to stdout")?;
    Ok(())
}

/// Await one fetch and log its failure instead of returning it.
///
/// The explicit "fire and log" wrapper: the source itself always surfaces
/// failures through the outcome.
async fn fetch_and_log(
    source: &AsyncFetchSource,
    config: &FetchConfig,
) -> Result<Option<FetchResult>> {
    let mut handle = source.fetch(config).context("invalid [fetch] config")?;
    match handle.outcome().await {
        Ok(result) => Ok(Some(result)),
        Err(err) => {
            tracing::error!(request_id = %handle.id(), status = %handle.status(), "{err}");
            Ok(None)
        }
    }
}

async fn run_cancelled(source: &AsyncFetchSource, config: &FetchConfig) -> Result<()> {
    let mut handle = source.fetch(config).context("invalid [fetch] config")?;
    handle.cancel();
    match handle.outcome().await {
        Ok(result) => tracing::warn!(records = result.len(), "Cancelled fetch still resolved"),
        Err(err) => tracing::info!(request_id = %handle.id(), status = %handle.status(), "{err}"),
    }
    Ok(())
}

async fn run_retried(
    source: &AsyncFetchSource,
    config: &FetchConfig,
    retry: &RetryConfig,
) -> Result<()> {
    let outcome = fetch_with_retry(source, config, retry)
        .await
        .context("invalid [fetch] config")?;
    let attempts = outcome.attempts();
    match outcome {
        RetryOutcome::Success { result, .. } => {
            tracing::info!(attempts, "Retried fetch resolved");
            print_json(&result)?;
        }
        RetryOutcome::Exhausted { source, .. } => {
            tracing::error!(attempts, "Retries exhausted: {source}");
        }
        RetryOutcome::NonRetryable { source, .. } => {
            tracing::error!(attempts, "Fetch failed without retry: {source}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match DemoConfig::load() {
        Ok(Some(config)) => {
            tracing::info!(path = %DemoConfig::path().display(), "Loaded config");
            config
        }
        Ok(None) => DemoConfig::default(),
        Err(err) => {
            tracing::warn!(path = %err.path().display(), "Using defaults: {err}");
            DemoConfig::default()
        }
    };

    let source = AsyncFetchSource::default();

    if let Some(result) = fetch_and_log(&source, &config.fetch).await? {
        print_json(&result)?;
    }

    run_cancelled(&source, &config.fetch).await?;

    run_retried(&source, &config.fetch, &config.retry_config()).await?;

    Ok(())
}
