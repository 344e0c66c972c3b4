//! # tickerpulse core
//!
//! Daily price retrieval and derived metrics for a fixed watch list of
//! tickers.
//!
//! ## Overview
//!
//! - **Domain types**: validated tickers, lookback windows, bars and metrics
//! - **Price source trait** with a Yahoo chart adapter behind an HTTP seam
//! - **Fetcher**: coerce, clean and derive one ticker, with retries
//! - **Batch runner**: bounded concurrent fan-out over many tickers
//! - **TTL cache** and **configuration** for the callers on top
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Price source adapters (Yahoo chart API) |
//! | [`batch`] | Concurrent fan-out and the per-ticker result table |
//! | [`cache`] | In-memory TTL cache |
//! | [`config`] | TOML configuration |
//! | [`data_source`] | Price source trait and raw table types |
//! | [`domain`] | Domain models |
//! | [`error`] | Core error types |
//! | [`fetcher`] | Single-ticker fetch with retries |
//! | [`http_client`] | HTTP client abstraction |
//! | [`retry`] | Retry policy and backoff |
//! | [`throttling`] | Request rate limiting |
//! | [`views`] | Derived views such as top movers |
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────────┐
//! │  fetch_many     │  one task per ticker, semaphore-bounded
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  fetch          │────▶│ RetryPolicy      │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PriceSource     │────▶│ HttpClient       │
//! └────────┬────────┘     └──────────────────┘
//!          │ RawTable
//!          ▼
//! ┌─────────────────┐
//! │ normalize       │  coerce, drop invalid rows, derive metrics
//! └─────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! Fetch operations never return errors. An empty response, a table with
//! no usable rows and a transport fault each consume one attempt; once
//! attempts run out the ticker resolves to [`ResultSet::NoData`] and the
//! batch omits it.

pub mod adapters;
pub mod batch;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod retry;
pub mod throttling;
pub mod views;

// Adapter implementations
pub use adapters::YahooChartSource;

// Batch fan-out
pub use batch::{fetch_each, fetch_many, FetchJob, TickerRow, TickerTable, DEFAULT_CONCURRENCY};

// Caching
pub use cache::{CacheKey, CacheMode, TtlCache, DEFAULT_CACHE_TTL};

// Configuration
pub use config::{ConfigError, TrackerConfig, DEFAULT_TICKERS};

// Price source trait and types
pub use data_source::{
    DailyBarsRequest, PriceSource, RawRow, RawTable, SourceError, SourceErrorKind,
};

// Domain models
pub use domain::{
    format_date, parse_date, DerivedMetrics, FetchMode, MetricsRow, Period, PriceBar, ResultSet,
    Ticker, Window,
};

// Error types
pub use error::ValidationError;

// Fetching
pub use fetcher::{coerce_price, fetch, normalize, FetchFailure};

// HTTP client
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Retry
pub use retry::{Backoff, BackoffKind, RetryPolicy};

// Throttling
pub use throttling::RequestThrottle;

// Views
pub use views::top_movers;
