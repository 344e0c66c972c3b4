//! Single-ticker fetch: request, clean, derive, retry.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::data_source::{DailyBarsRequest, PriceSource, RawTable, SourceError};
use crate::{FetchMode, MetricsRow, PriceBar, ResultSet, RetryPolicy, Ticker, Window};

/// Why a single attempt produced no usable rows.
///
/// Every variant is retried the same way and none of them reaches the
/// caller; they exist for log events only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchFailure {
    #[error("source returned no rows")]
    EmptyResponse,
    #[error("all {rows} rows had missing or non-numeric prices")]
    InvalidData { rows: usize },
    #[error("transport fault: {0}")]
    TransportFault(#[from] SourceError),
}

/// Coerce an upstream cell to a price. Numbers and numeric strings are
/// accepted; `null`, text such as `"N/A"`, NaN and infinities are missing.
pub fn coerce_price(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Turn a raw table into ordered metric rows.
///
/// Rows with a missing or invalid price are dropped before any metric is
/// computed. Output dates are ascending and unique; for a repeated date the
/// later row wins.
pub fn normalize(table: RawTable, mode: FetchMode) -> Result<Vec<MetricsRow>, FetchFailure> {
    if table.is_empty() {
        return Err(FetchFailure::EmptyResponse);
    }

    let total = table.rows.len();
    let mut bars: Vec<PriceBar> = table
        .rows
        .into_iter()
        .filter_map(|row| {
            PriceBar::checked(
                row.date,
                coerce_price(&row.open)?,
                coerce_price(&row.high)?,
                coerce_price(&row.low)?,
                coerce_price(&row.close)?,
            )
        })
        .collect();

    // stable sort keeps upstream order within a date, so the last one is kept
    bars.sort_by_key(|bar| bar.date);
    bars.reverse();
    bars.dedup_by_key(|bar| bar.date);
    bars.reverse();

    if bars.is_empty() {
        return Err(FetchFailure::InvalidData { rows: total });
    }

    if mode == FetchMode::LatestOnly {
        bars = bars.split_off(bars.len() - 1);
    }

    Ok(bars.into_iter().map(MetricsRow::from_bar).collect())
}

/// Fetch one ticker with retries.
///
/// Never fails: after `retry.max_attempts()` unsuccessful attempts the
/// result is [`ResultSet::NoData`] and a warning is logged.
pub async fn fetch(
    source: &dyn PriceSource,
    ticker: &Ticker,
    mode: FetchMode,
    window: &Window,
    retry: &RetryPolicy,
) -> ResultSet {
    let max_attempts = retry.max_attempts();

    for attempt in 0..max_attempts {
        let request = DailyBarsRequest::new(ticker.clone(), *window);
        let outcome = match source.daily_bars(request).await {
            Ok(table) => normalize(table, mode),
            Err(error) => Err(FetchFailure::from(error)),
        };

        match outcome {
            Ok(rows) => {
                debug!(
                    ticker = %ticker,
                    source = source.name(),
                    rows = rows.len(),
                    attempt = attempt + 1,
                    "fetched daily bars"
                );
                return ResultSet::from_rows(rows);
            }
            Err(failure) => {
                warn!(
                    ticker = %ticker,
                    source = source.name(),
                    attempt = attempt + 1,
                    max_attempts,
                    error = %failure,
                    "fetch attempt failed"
                );
            }
        }

        if attempt + 1 < max_attempts {
            tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
        }
    }

    warn!(
        ticker = %ticker,
        window = %window,
        max_attempts,
        "no data after exhausting retries"
    );
    ResultSet::NoData
}
