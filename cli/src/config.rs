use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use mockfetch_source::FetchConfig;
use mockfetch_source::retry::{RetryConfig, effective_jitter};

const CONFIG_ENV: &str = "MOCKFETCH_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "mockfetch.toml";

#[derive(Debug, Default, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    pub retry: Option<RetrySection>,
}

/// `[retry]` table. Absent keys keep the built-in policy.
#[derive(Debug, Default, Deserialize)]
pub struct RetrySection {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub jitter_factor: Option<f64>,
    pub attempt_timeout_ms: Option<u64>,
}

impl RetrySection {
    pub fn to_retry_config(&self) -> RetryConfig {
        let defaults = RetryConfig::default();
        RetryConfig {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            initial_delay: self
                .initial_delay_ms
                .map_or(defaults.initial_delay, Duration::from_millis),
            max_delay: self
                .max_delay_ms
                .map_or(defaults.max_delay, Duration::from_millis),
            jitter_factor: self
                .jitter_factor
                .map_or(defaults.jitter_factor, effective_jitter),
            attempt_timeout: self.attempt_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl DemoConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// `$MOCKFETCH_CONFIG`, or `mockfetch.toml` in the working directory.
    #[must_use]
    pub fn path() -> PathBuf {
        env::var_os(CONFIG_ENV)
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry
            .as_ref()
            .map(RetrySection::to_retry_config)
            .unwrap_or_default()
    }
}
