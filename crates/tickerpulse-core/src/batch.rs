//! Bounded fan-out of single-ticker fetches.
//!
//! Each ticker runs in its own tokio task; a semaphore caps how many are in
//! flight. Tasks never share state: each hands `(index, ResultSet)` back to
//! the collector, which assembles the table in input order once every task
//! has finished.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::data_source::PriceSource;
use crate::fetcher::fetch;
use crate::{FetchMode, MetricsRow, ResultSet, RetryPolicy, Ticker, Window};

/// Default number of simultaneous fetches.
pub const DEFAULT_CONCURRENCY: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(limit) => limit,
    None => NonZeroUsize::MIN,
};

/// One unit of batch work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub ticker: Ticker,
    pub mode: FetchMode,
    pub window: Window,
}

impl FetchJob {
    pub fn new(ticker: Ticker, mode: FetchMode, window: Window) -> Self {
        Self {
            ticker,
            mode,
            window,
        }
    }
}

/// A row tagged with the ticker it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerRow {
    pub ticker: Ticker,
    #[serde(flatten)]
    pub row: MetricsRow,
}

/// Batch result: tickers that produced data, in request order.
///
/// Tickers whose fetch ended in `NoData` are absent; an empty table means no
/// ticker produced data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TickerTable {
    entries: IndexMap<Ticker, Vec<MetricsRow>>,
}

impl TickerTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&[MetricsRow]> {
        self.entries.get(ticker).map(Vec::as_slice)
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.entries.contains_key(ticker)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &[MetricsRow])> {
        self.entries
            .iter()
            .map(|(ticker, rows)| (ticker, rows.as_slice()))
    }

    /// All rows concatenated, ticker by ticker.
    pub fn rows(&self) -> Vec<TickerRow> {
        self.iter()
            .flat_map(|(ticker, rows)| {
                rows.iter().map(move |row| TickerRow {
                    ticker: ticker.clone(),
                    row: *row,
                })
            })
            .collect()
    }
}

/// Run one fetch per job with at most `concurrency` in flight.
///
/// A repeated ticker is fetched once, using its first job.
pub async fn fetch_each(
    source: Arc<dyn PriceSource>,
    jobs: Vec<FetchJob>,
    retry: RetryPolicy,
    concurrency: NonZeroUsize,
) -> TickerTable {
    let mut seen = HashSet::new();
    let jobs: Vec<FetchJob> = jobs
        .into_iter()
        .filter(|job| seen.insert(job.ticker.clone()))
        .collect();

    let permits = Arc::new(Semaphore::new(concurrency.get()));
    let mut tasks = JoinSet::new();

    for (index, job) in jobs.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = fetch(source.as_ref(), &job.ticker, job.mode, &job.window, &retry).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<ResultSet>> = vec![None; jobs.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(error) => warn!(error = %error, "fetch task ended abnormally"),
        }
    }

    let requested = jobs.len();
    let mut entries = IndexMap::with_capacity(requested);
    for (job, result) in jobs.into_iter().zip(results) {
        match result {
            Some(ResultSet::Rows(rows)) => {
                entries.insert(job.ticker, rows);
            }
            Some(ResultSet::NoData) => {}
            None => warn!(ticker = %job.ticker, "fetch task did not complete; ticker omitted"),
        }
    }

    info!(
        requested,
        returned = entries.len(),
        source = source.name(),
        "batch fetch complete"
    );
    TickerTable { entries }
}

/// Fetch every ticker with the same mode and window.
pub async fn fetch_many(
    source: Arc<dyn PriceSource>,
    tickers: &[Ticker],
    mode: FetchMode,
    window: Window,
    retry: RetryPolicy,
    concurrency: NonZeroUsize,
) -> TickerTable {
    let jobs = tickers
        .iter()
        .map(|ticker| FetchJob::new(ticker.clone(), mode, window))
        .collect();
    fetch_each(source, jobs, retry, concurrency).await
}
