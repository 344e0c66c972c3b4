//! Behavior-driven tests for single-ticker fetching
//!
//! These tests verify HOW a fetch turns raw upstream tables into metric rows,
//! and how it retries when the source comes back empty, malformed or failing.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use tickerpulse_core::{
    fetch, DailyBarsRequest, FetchMode, PriceSource, RawRow, RawTable, ResultSet, RetryPolicy,
    SourceError, Window,
};
use tickerpulse_tests::{aapl, no_wait};
use time::macros::date;

/// Source that replays scripted responses, then repeats the last one.
struct ScriptedSource {
    script: Mutex<VecDeque<Result<RawTable, SourceError>>>,
    last: Result<RawTable, SourceError>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(script: Vec<Result<RawTable, SourceError>>) -> Self {
        let last = script.last().cloned().unwrap_or_else(|| Ok(RawTable::default()));
        Self {
            script: Mutex::new(script.into()),
            last,
            calls: AtomicUsize::new(0),
        }
    }

    fn always(response: Result<RawTable, SourceError>) -> Self {
        Self::new(vec![response])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn daily_bars<'a>(
        &'a self,
        _req: DailyBarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawTable, SourceError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| self.last.clone());
        Box::pin(async move { next })
    }
}

fn sample_table() -> RawTable {
    RawTable::new(vec![
        RawRow::new(date!(2024 - 01 - 02), 100.0, 105.0, 99.0, 103.0),
        RawRow::new(date!(2024 - 01 - 03), 103.0, 106.0, 102.0, 104.5),
        RawRow::new(date!(2024 - 01 - 04), 104.0, 104.0, 100.0, 101.0),
    ])
}

// =============================================================================
// Fetch: Metric Derivation
// =============================================================================

#[tokio::test]
async fn when_source_returns_reference_bar_system_derives_expected_metrics() {
    // Given: A source returning one known bar
    let source = ScriptedSource::always(Ok(RawTable::new(vec![RawRow::new(
        date!(2024 - 01 - 02),
        100.0,
        105.0,
        99.0,
        103.0,
    )])));

    // When: The ticker is fetched over its full window
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    // Then: Upward move, its percentage and the daily range follow the bar
    let rows = result.rows();
    assert_eq!(rows.len(), 1);
    let metrics = rows[0].metrics;
    assert_eq!(metrics.upward_move, 6.0);
    assert!((metrics.upward_move_pct - 6.0606).abs() < 1e-4);
    assert_eq!(metrics.daily_range, 3.0);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn when_low_is_zero_system_reports_zero_percent_instead_of_infinity() {
    // Given: A bar whose low is exactly zero
    let source = ScriptedSource::always(Ok(RawTable::new(vec![RawRow::new(
        date!(2024 - 01 - 02),
        0.5,
        2.0,
        0.0,
        1.0,
    )])));

    // When: The ticker is fetched
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(1),
    )
    .await;

    // Then: The percentage is a finite zero
    let row = result.latest().expect("one row");
    assert_eq!(row.metrics.upward_move, 2.0);
    assert_eq!(row.metrics.upward_move_pct, 0.0);
}

#[tokio::test]
async fn when_latest_only_requested_system_returns_single_most_recent_row() {
    // Given: A source returning a three-day window
    let source = ScriptedSource::always(Ok(sample_table()));

    // When: Only the latest bar is requested
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::LatestOnly,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    // Then: Exactly one row remains, dated at the end of the window
    assert_eq!(result.len(), 1);
    let row = result.latest().expect("latest row");
    assert_eq!(row.date(), date!(2024 - 01 - 04));
    assert_eq!(row.metrics.daily_range, -3.0);
}

#[tokio::test]
async fn when_full_window_requested_rows_are_ascending_by_date() {
    // Given: A source returning rows out of order
    let mut rows = sample_table().rows;
    rows.reverse();
    let source = ScriptedSource::always(Ok(RawTable::new(rows)));

    // When: The full window is fetched
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(1),
    )
    .await;

    // Then: Dates are strictly ascending
    let rows = result.rows();
    assert_eq!(rows.len(), 3);
    assert!(rows.windows(2).all(|pair| pair[0].date() < pair[1].date()));
}

#[tokio::test]
async fn when_some_prices_are_missing_only_complete_rows_survive() {
    // Given: One complete row and two with missing cells
    let source = ScriptedSource::always(Ok(RawTable::new(vec![
        RawRow::new(date!(2024 - 01 - 02), json!(100.0), json!(105.0), json!(99.0), json!("N/A")),
        RawRow::new(date!(2024 - 01 - 03), json!("103"), json!("106"), json!("102"), json!("104")),
        RawRow::new(date!(2024 - 01 - 04), json!(null), json!(104.0), json!(100.0), json!(101.0)),
    ])));

    // When: The ticker is fetched
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    // Then: Only the numeric-string row is kept, coerced to numbers
    let rows = result.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date(), date!(2024 - 01 - 03));
    assert_eq!(rows[0].metrics.upward_move, 4.0);
    assert_eq!(source.calls(), 1);
}

// =============================================================================
// Fetch: Retry Behavior
// =============================================================================

#[tokio::test]
async fn when_source_is_always_empty_system_gives_up_after_max_attempts() {
    // Given: A source that never returns rows
    let source = ScriptedSource::always(Ok(RawTable::default()));

    // When: The ticker is fetched with three attempts
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::LatestOnly,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    // Then: The source was asked exactly three times and no data is reported
    assert_eq!(source.calls(), 3);
    assert_eq!(result, ResultSet::NoData);
    assert!(result.is_no_data());
}

#[tokio::test]
async fn when_every_close_is_unavailable_the_attempt_is_retried() {
    // Given: First response has only "N/A" closes, second is valid
    let unusable = RawTable::new(vec![
        RawRow::new(date!(2024 - 01 - 02), json!(1.0), json!(2.0), json!(0.5), json!("N/A")),
        RawRow::new(date!(2024 - 01 - 03), json!(1.0), json!(2.0), json!(0.5), json!("N/A")),
    ]);
    let source = ScriptedSource::new(vec![Ok(unusable), Ok(sample_table())]);

    // When: The ticker is fetched
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    // Then: The second attempt supplies the data
    assert_eq!(source.calls(), 2);
    assert_eq!(result.len(), 3);
}

#[tokio::test]
async fn when_source_fails_transiently_a_later_attempt_succeeds() {
    // Given: A transport error followed by a valid table
    let source = ScriptedSource::new(vec![
        Err(SourceError::transport("connection reset")),
        Err(SourceError::rate_limited("slow down")),
        Ok(sample_table()),
    ]);

    // When: The ticker is fetched with three attempts
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::LatestOnly,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    // Then: The third attempt wins
    assert_eq!(source.calls(), 3);
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn when_source_always_errors_failure_is_not_surfaced_to_caller() {
    // Given: A source that always fails at the transport level
    let source = ScriptedSource::always(Err(SourceError::upstream("Not Found")));

    // When: The ticker is fetched
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(2),
    )
    .await;

    // Then: The outcome is the same NoData as for an empty response
    assert_eq!(source.calls(), 2);
    assert!(result.is_no_data());
    assert!(result.rows().is_empty());
}

#[tokio::test]
async fn when_single_attempt_policy_is_used_source_is_called_once() {
    // Given: An empty source and a one-shot policy
    let source = ScriptedSource::always(Ok(RawTable::default()));

    // When: The ticker is fetched
    let result = fetch(
        &source,
        &aapl(),
        FetchMode::LatestOnly,
        &Window::default(),
        &RetryPolicy::once(),
    )
    .await;

    // Then: No retry happens
    assert_eq!(source.calls(), 1);
    assert!(result.is_no_data());
}

#[tokio::test]
async fn retry_waits_the_configured_delay_between_attempts() {
    // Given: An empty source and a 30ms fixed delay
    let source = ScriptedSource::always(Ok(RawTable::default()));
    let policy = RetryPolicy::fixed(3, Duration::from_millis(30)).expect("valid");

    // When: The ticker is fetched
    let started = std::time::Instant::now();
    let _ = fetch(&source, &aapl(), FetchMode::LatestOnly, &Window::default(), &policy).await;

    // Then: Two waits separate three attempts; none follows the last one
    assert!(started.elapsed() >= Duration::from_millis(60));
    assert_eq!(source.calls(), 3);
}
