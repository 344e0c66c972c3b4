//! Price source trait and request/response types.
//!
//! A [`PriceSource`] is the pull boundary of the fetcher: it returns the raw
//! daily table for one ticker and leaves coercion, cleaning and metric
//! derivation to [`crate::fetcher`]. Cells are untyped so that malformed
//! upstream values (`null`, `"N/A"`) reach the normalizer intact.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use time::Date;

use crate::{Ticker, Window};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Transport,
    RateLimited,
    Upstream,
    Parse,
}

/// Structured error returned by a price source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Upstream,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Upstream => "source.upstream",
            SourceErrorKind::Parse => "source.parse",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request for daily bars of one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBarsRequest {
    pub ticker: Ticker,
    pub window: Window,
}

impl DailyBarsRequest {
    pub fn new(ticker: Ticker, window: Window) -> Self {
        Self { ticker, window }
    }
}

/// One upstream row before coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: Date,
    pub open: Value,
    pub high: Value,
    pub low: Value,
    pub close: Value,
}

impl RawRow {
    pub fn new(
        date: Date,
        open: impl Into<Value>,
        high: impl Into<Value>,
        low: impl Into<Value>,
        close: impl Into<Value>,
    ) -> Self {
        Self {
            date,
            open: open.into(),
            high: high.into(),
            low: low.into(),
            close: close.into(),
        }
    }
}

/// Raw daily table as returned by a source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pull-style daily price source.
///
/// Implementations must be `Send + Sync`; the batch runner shares one source
/// across all of its worker tasks.
pub trait PriceSource: Send + Sync {
    /// Short identifier used in logs, e.g. `yahoo`.
    fn name(&self) -> &'static str;

    /// Fetches the daily table for one ticker and window.
    ///
    /// An `Ok` with zero rows is a valid answer; the fetcher decides whether
    /// to retry it.
    fn daily_bars<'a>(
        &'a self,
        req: DailyBarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawTable, SourceError>> + Send + 'a>>;
}
