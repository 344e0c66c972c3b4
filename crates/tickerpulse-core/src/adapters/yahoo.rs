use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::{Date, OffsetDateTime};

use crate::data_source::{DailyBarsRequest, PriceSource, RawRow, RawTable, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::throttling::RequestThrottle;
use crate::{Period, Window};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Daily bars from the Yahoo Finance v8 chart endpoint.
#[derive(Clone)]
pub struct YahooChartSource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
    throttle: Option<RequestThrottle>,
}

impl Default for YahooChartSource {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::default()))
    }
}

impl YahooChartSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: 10_000,
            throttle: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_throttle(mut self, throttle: RequestThrottle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Chart URL for a request; the interval is always one day.
    pub fn chart_url(&self, req: &DailyBarsRequest) -> String {
        let window = match req.window {
            Window::Relative(period) => format!("range={}", yahoo_range(period)),
            Window::Explicit { start, end } => format!(
                "period1={}&period2={}",
                midnight_unix(start),
                midnight_unix(end)
            ),
        };

        format!(
            "{}/v8/finance/chart/{}?{}&interval=1d&includePrePost=false",
            self.base_url,
            urlencoding::encode(req.ticker.as_str()),
            window
        )
    }

    async fn fetch_chart(&self, req: &DailyBarsRequest) -> Result<RawTable, SourceError> {
        if let Some(throttle) = &self.throttle {
            throttle.ready().await;
        }

        let request = HttpRequest::get(self.chart_url(req))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            if e.timed_out() {
                SourceError::transport(format!("yahoo request timed out: {}", e.message()))
            } else {
                SourceError::transport(format!("yahoo transport error: {}", e.message()))
            }
        })?;

        if response.status == 429 {
            return Err(SourceError::rate_limited("yahoo returned status 429"));
        }

        // 404 responses still carry a chart error body worth reporting
        if !response.is_success() && response.status != 404 {
            return Err(SourceError::upstream(format!(
                "yahoo returned status {}",
                response.status
            )));
        }

        let chart: YahooChartResponse = serde_json::from_str(&response.body)
            .map_err(|e| SourceError::parse(format!("failed to parse yahoo chart: {e}")))?;

        if let Some(error) = chart.chart.error {
            return Err(SourceError::upstream(format!(
                "yahoo chart error: {}",
                error.describe()
            )));
        }
        if !response.is_success() {
            return Err(SourceError::upstream(format!(
                "yahoo returned status {}",
                response.status
            )));
        }

        let Some(result) = chart.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(RawTable::default());
        };

        parse_chart_result(result)
    }
}

impl PriceSource for YahooChartSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn daily_bars<'a>(
        &'a self,
        req: DailyBarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawTable, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_chart(&req).await })
    }
}

fn parse_chart_result(result: YahooChartResult) -> Result<RawTable, SourceError> {
    let offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut rows = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        rows.push(RawRow {
            date: trading_date(*ts, offset)?,
            open: cell(&quote.open, i),
            high: cell(&quote.high, i),
            low: cell(&quote.low, i),
            close: cell(&quote.close, i),
        });
    }

    Ok(RawTable::new(rows))
}

fn cell(values: &[Value], index: usize) -> Value {
    values.get(index).cloned().unwrap_or(Value::Null)
}

/// Bar timestamps mark the session open; shifting by the exchange offset
/// yields the local trading date.
fn trading_date(ts: i64, gmtoffset: i64) -> Result<Date, SourceError> {
    OffsetDateTime::from_unix_timestamp(ts.saturating_add(gmtoffset))
        .map(OffsetDateTime::date)
        .map_err(|e| SourceError::parse(format!("invalid bar timestamp {ts}: {e}")))
}

fn midnight_unix(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

fn yahoo_range(period: Period) -> String {
    match period {
        Period::Weeks(n) => format!("{}d", n.saturating_mul(7)),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => String::from("unknown error"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Value>,
    #[serde(default)]
    high: Vec<Value>,
    #[serde(default)]
    low: Vec<Value>,
    #[serde(default)]
    close: Vec<Value>,
}
