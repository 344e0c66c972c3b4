//! Contract tests for the Yahoo chart adapter driven through `fetch`.
//!
//! Responses are canned chart payloads served by a fixture HTTP client, so
//! the full path from HTTP body to metric rows runs without a network.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tickerpulse_core::{
    fetch, fetch_many, DailyBarsRequest, FetchMode, HttpClient, HttpError, HttpRequest,
    HttpResponse, Period, PriceSource, SourceErrorKind, Ticker, Window,
    YahooChartSource,
};
use tickerpulse_tests::{aapl, no_wait};
use time::macros::date;

// 2024-01-02..04 at 14:30 UTC, i.e. the 09:30 New York open
const THREE_DAY_CHART: &str = r#"{
  "chart": {
    "result": [{
      "meta": { "symbol": "AAPL", "currency": "USD", "gmtoffset": -18000 },
      "timestamp": [1704205800, 1704292200, 1704378600],
      "indicators": {
        "quote": [{
          "open":   [100.0, 103.0, 104.0],
          "high":   [105.0, 106.0, 104.0],
          "low":    [99.0, 102.0, 100.0],
          "close":  [103.0, null, 101.0],
          "volume": [1000, 1100, 900]
        }]
      }
    }],
    "error": null
  }
}"#;

const NOT_FOUND_CHART: &str = r#"{
  "chart": {
    "result": null,
    "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
  }
}"#;

const EMPTY_CHART: &str = r#"{
  "chart": {
    "result": [{
      "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
      "timestamp": [],
      "indicators": { "quote": [{}] }
    }],
    "error": null
  }
}"#;

/// HTTP client that serves queued responses, then repeats the last one.
struct FixtureHttpClient {
    queue: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    last: Result<HttpResponse, HttpError>,
    urls: Mutex<Vec<String>>,
}

impl FixtureHttpClient {
    fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        let last = responses
            .last()
            .cloned()
            .unwrap_or_else(|| Err(HttpError::new("no fixture")));
        Self {
            queue: Mutex::new(responses.into()),
            last,
            urls: Mutex::new(Vec::new()),
        }
    }

    fn serving(status: u16, body: &str) -> Self {
        Self::new(vec![Ok(HttpResponse {
            status,
            body: body.to_owned(),
        })])
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("urls lock").clone()
    }
}

impl HttpClient for FixtureHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.urls.lock().expect("urls lock").push(request.url);
        let next = self
            .queue
            .lock()
            .expect("queue lock")
            .pop_front()
            .unwrap_or_else(|| self.last.clone());
        Box::pin(async move { next })
    }
}

fn yahoo(client: &Arc<FixtureHttpClient>) -> YahooChartSource {
    YahooChartSource::new(client.clone()).with_base_url("https://chart.test/")
}

#[tokio::test]
async fn chart_payload_becomes_dated_metric_rows() {
    let client = Arc::new(FixtureHttpClient::serving(200, THREE_DAY_CHART));
    let source = yahoo(&client);

    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    // the null close drops the middle session
    let rows = result.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date(), date!(2024 - 01 - 02));
    assert_eq!(rows[1].date(), date!(2024 - 01 - 04));
    assert_eq!(rows[0].metrics.upward_move, 6.0);
    assert_eq!(rows[0].metrics.daily_range, 3.0);
    assert_eq!(rows[1].metrics.upward_move, 4.0);
    assert_eq!(client.urls().len(), 1);
}

#[tokio::test]
async fn latest_only_uses_the_last_valid_session() {
    let client = Arc::new(FixtureHttpClient::serving(200, THREE_DAY_CHART));
    let source = yahoo(&client);

    let result = fetch(
        &source,
        &aapl(),
        FetchMode::LatestOnly,
        &Window::default(),
        &no_wait(1),
    )
    .await;

    let latest = result.latest().expect("latest row");
    assert_eq!(result.len(), 1);
    assert_eq!(latest.date(), date!(2024 - 01 - 04));
    assert_eq!(latest.bar.close, 101.0);
}

#[tokio::test]
async fn unknown_ticker_resolves_to_no_data_after_all_attempts() {
    let client = Arc::new(FixtureHttpClient::serving(404, NOT_FOUND_CHART));
    let source = yahoo(&client);

    let result = fetch(
        &source,
        &aapl(),
        FetchMode::LatestOnly,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    assert!(result.is_no_data());
    assert_eq!(client.urls().len(), 3);
}

#[tokio::test]
async fn not_found_body_is_reported_as_upstream_error() {
    let client = Arc::new(FixtureHttpClient::serving(404, NOT_FOUND_CHART));
    let source = yahoo(&client);

    let error = source
        .daily_bars(DailyBarsRequest::new(aapl(), Window::default()))
        .await
        .expect_err("404 must fail");

    assert_eq!(error.kind(), SourceErrorKind::Upstream);
    assert!(error.message().contains("Not Found"));
}

#[tokio::test]
async fn empty_chart_is_retried_like_any_empty_response() {
    let client = Arc::new(FixtureHttpClient::new(vec![
        Ok(HttpResponse::ok_json(EMPTY_CHART)),
        Ok(HttpResponse::ok_json(THREE_DAY_CHART)),
    ]));
    let source = yahoo(&client);

    let result = fetch(
        &source,
        &aapl(),
        FetchMode::LatestOnly,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    assert_eq!(result.len(), 1);
    assert_eq!(client.urls().len(), 2);
}

#[tokio::test]
async fn rate_limit_and_timeout_are_retried() {
    let client = Arc::new(FixtureHttpClient::new(vec![
        Ok(HttpResponse {
            status: 429,
            body: "Too Many Requests".to_owned(),
        }),
        Err(HttpError::timeout("deadline elapsed")),
        Ok(HttpResponse::ok_json(THREE_DAY_CHART)),
    ]));
    let source = yahoo(&client);

    let result = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::default(),
        &no_wait(3),
    )
    .await;

    assert_eq!(result.len(), 2);
    assert_eq!(client.urls().len(), 3);
}

#[tokio::test]
async fn request_urls_follow_the_window() {
    let client = Arc::new(FixtureHttpClient::serving(200, THREE_DAY_CHART));
    let source = yahoo(&client);
    let explicit = Window::explicit(date!(2024 - 01 - 02), date!(2024 - 01 - 03)).expect("valid");

    let _ = fetch(
        &source,
        &aapl(),
        FetchMode::FullWindow,
        &Window::Relative(Period::Years(1)),
        &no_wait(1),
    )
    .await;
    let _ = fetch(&source, &aapl(), FetchMode::FullWindow, &explicit, &no_wait(1)).await;

    let urls = client.urls();
    assert_eq!(
        urls[0],
        "https://chart.test/v8/finance/chart/AAPL?range=1y&interval=1d&includePrePost=false"
    );
    assert_eq!(
        urls[1],
        "https://chart.test/v8/finance/chart/AAPL?period1=1704153600&period2=1704240000&interval=1d&includePrePost=false"
    );
}

#[tokio::test]
async fn batch_over_yahoo_omits_tickers_without_data() {
    let client = Arc::new(FixtureHttpClient::serving(200, THREE_DAY_CHART));
    let good = yahoo(&client);

    let table = fetch_many(
        Arc::new(good),
        &Ticker::parse_list("AAPL,MSFT").expect("valid"),
        FetchMode::LatestOnly,
        Window::default(),
        no_wait(1),
        std::num::NonZeroUsize::MIN,
    )
    .await;
    assert_eq!(table.len(), 2);

    let missing = Arc::new(FixtureHttpClient::serving(404, NOT_FOUND_CHART));
    let table = fetch_many(
        Arc::new(yahoo(&missing)),
        &Ticker::parse_list("AAPL,MSFT").expect("valid"),
        FetchMode::LatestOnly,
        Window::default(),
        no_wait(2),
        std::num::NonZeroUsize::MIN,
    )
    .await;
    assert!(table.is_empty());
    assert_eq!(missing.urls().len(), 4);
}
