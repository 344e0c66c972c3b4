mod history;
mod latest;
mod sync;
mod watch;

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde_json::{json, Value};
use tickerpulse_core::{
    Period, PriceSource, RetryPolicy, Ticker, TickerTable, TrackerConfig, TtlCache,
    YahooChartSource,
};
use tracing::warn;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Reporter;

pub const NO_DATA_WARNING: &str = "No data available.";

/// A titled block of table rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// Output of one command run, in every renderable shape.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub command: &'static str,
    /// Document for `--format json`.
    pub data: Value,
    /// One object per line for `--format ndjson`.
    pub records: Vec<Value>,
    pub sections: Vec<Section>,
    pub warnings: Vec<String>,
    /// No ticker produced data.
    pub no_data: bool,
}

impl CommandResult {
    pub fn no_data(command: &'static str) -> Self {
        warn!(command, "{NO_DATA_WARNING}");
        Self {
            command,
            data: json!({}),
            records: Vec::new(),
            sections: Vec::new(),
            warnings: vec![NO_DATA_WARNING.to_owned()],
            no_data: true,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Validated settings and shared services for one invocation.
pub struct Context {
    pub config: TrackerConfig,
    pub tickers: Vec<Ticker>,
    pub period: Period,
    pub retry: RetryPolicy,
    pub concurrency: NonZeroUsize,
    pub source: Arc<dyn PriceSource>,
    pub cache: TtlCache<TickerTable>,
}

impl Context {
    pub fn new(config: TrackerConfig, source: Arc<dyn PriceSource>) -> Result<Self, CliError> {
        Ok(Self {
            tickers: config.tickers()?,
            period: config.period()?,
            retry: config.retry_policy()?,
            concurrency: config.concurrency()?,
            cache: TtlCache::new(config.cache_ttl()),
            source,
            config,
        })
    }
}

/// Config file (or defaults) with command-line overrides applied.
pub fn settings(cli: &Cli) -> Result<TrackerConfig, CliError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };

    if let Some(raw) = cli.tickers.as_deref() {
        config.tickers = Ticker::parse_list(raw)?
            .into_iter()
            .map(String::from)
            .collect();
    }
    if let Some(retries) = cli.retries {
        config.retry_attempts = retries;
    }
    if let Some(delay) = cli.retry_delay_secs {
        config.retry_delay_secs = delay;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }

    config.validate()?;
    Ok(config)
}

fn yahoo_source(config: &TrackerConfig) -> Arc<dyn PriceSource> {
    let mut source = YahooChartSource::default()
        .with_base_url(config.yahoo_base_url.as_str())
        .with_timeout_ms(config.request_timeout_ms);
    if let Some(throttle) = config.throttle() {
        source = source.with_throttle(throttle);
    }
    Arc::new(source)
}

pub async fn run(cli: &Cli, reporter: &mut Reporter) -> Result<(), CliError> {
    let config = settings(cli)?;
    let source = yahoo_source(&config);
    let ctx = Context::new(config, source)?;
    dispatch(&cli.command, &ctx, reporter).await
}

pub async fn dispatch(
    command: &Command,
    ctx: &Context,
    reporter: &mut Reporter,
) -> Result<(), CliError> {
    match command {
        Command::Latest(args) => reporter.emit(&latest::run(args, ctx).await?),
        Command::History(args) => reporter.emit(&history::run(args, ctx).await?),
        Command::Sync(args) => reporter.emit(&sync::run(args, ctx).await?),
        Command::Watch(args) => watch::run(args, ctx, reporter).await,
    }
}

/// Parse an optional period flag, falling back to the configured one.
fn period_or(raw: Option<&str>, fallback: Period) -> Result<Period, CliError> {
    match raw {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(fallback),
    }
}

fn ticker_list(tickers: &[Ticker]) -> String {
    tickers
        .iter()
        .map(Ticker::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
