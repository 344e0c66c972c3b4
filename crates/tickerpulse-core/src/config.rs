//! TOML-backed tracker configuration.
//!
//! Every key is optional; missing keys take the defaults below. Raw values
//! stay as plain strings and numbers so a config file round-trips, and are
//! validated into typed values through the accessor methods.
//!
//! ```toml
//! tickers = ["NVDA", "MSFT", "AAPL"]
//! period = "30d"
//! retry_attempts = 3
//! retry_delay_secs = 5
//! retry_backoff = "fixed"      # or "exponential"
//! retry_max_delay_secs = 60    # exponential only
//! concurrency = 3
//! cache_ttl_secs = 600
//! ```

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::yahoo::DEFAULT_BASE_URL;
use crate::{
    Backoff, BackoffKind, Period, RequestThrottle, RetryPolicy, Ticker, ValidationError,
};

/// Longest accepted `cache_ttl_secs`, one day.
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// Tickers tracked when none are configured.
pub const DEFAULT_TICKERS: [&str; 10] = [
    "NVDA", "MSFT", "AAPL", "AMZN", "META", "GOOGL", "AVGO", "BRK.B", "TSLA", "JPM",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    pub tickers: Vec<String>,
    pub period: String,
    pub retry_attempts: u32,
    /// Fixed wait, or the first wait when backing off exponentially.
    pub retry_delay_secs: u64,
    pub retry_backoff: BackoffKind,
    pub retry_max_delay_secs: u64,
    pub concurrency: usize,
    pub cache_ttl_secs: u64,
    pub top_n: usize,
    pub request_timeout_ms: u64,
    /// Unthrottled when absent.
    pub requests_per_second: Option<u32>,
    pub store_dir: PathBuf,
    pub yahoo_base_url: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| (*t).to_owned()).collect(),
            period: Period::default().to_string(),
            retry_attempts: 3,
            retry_delay_secs: 5,
            retry_backoff: BackoffKind::Fixed,
            retry_max_delay_secs: 60,
            concurrency: 3,
            cache_ttl_secs: 600,
            top_n: 10,
            request_timeout_ms: 10_000,
            requests_per_second: None,
            store_dir: PathBuf::from("data"),
            yahoo_base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Check every field that has a typed form.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tickers()?;
        self.period()?;
        self.retry_policy()?;
        self.concurrency()?;
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ValidationError::CacheTtlTooLong {
                secs: self.cache_ttl_secs,
                max: MAX_CACHE_TTL_SECS,
            });
        }
        Ok(())
    }

    /// Configured tickers, normalized, first occurrence kept.
    pub fn tickers(&self) -> Result<Vec<Ticker>, ValidationError> {
        let mut tickers: Vec<Ticker> = Vec::with_capacity(self.tickers.len());
        for raw in &self.tickers {
            let ticker = Ticker::parse(raw)?;
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }
        Ok(tickers)
    }

    pub fn period(&self) -> Result<Period, ValidationError> {
        self.period.parse()
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ValidationError> {
        let delay = Duration::from_secs(self.retry_delay_secs);
        let backoff = match self.retry_backoff {
            BackoffKind::Fixed => Backoff::Fixed(delay),
            BackoffKind::Exponential => Backoff::Doubling {
                initial: delay,
                cap: Duration::from_secs(self.retry_max_delay_secs).max(delay),
            },
        };
        RetryPolicy::new(self.retry_attempts, backoff)
    }

    pub fn concurrency(&self) -> Result<NonZeroUsize, ValidationError> {
        NonZeroUsize::new(self.concurrency).ok_or(ValidationError::ZeroConcurrency)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Request throttle, if a positive rate is configured.
    pub fn throttle(&self) -> Option<RequestThrottle> {
        self.requests_per_second
            .and_then(NonZeroU32::new)
            .map(RequestThrottle::per_second)
    }
}
