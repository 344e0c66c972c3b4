use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(trading_date, Date, "[year]-[month]-[day]");

/// Whether a fetch keeps the whole window or only its most recent bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    LatestOnly,
    FullWindow,
}

impl FetchMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LatestOnly => "latest_only",
            Self::FullWindow => "full_window",
        }
    }
}

/// One trading day of validated prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(with = "trading_date")]
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// Build a bar when every price is finite, non-negative and `high >= low`.
    pub fn checked(date: Date, open: f64, high: f64, low: f64, close: f64) -> Option<Self> {
        let prices = [open, high, low, close];
        if prices.iter().any(|price| !price.is_finite() || *price < 0.0) {
            return None;
        }
        if high < low {
            return None;
        }
        Some(Self {
            date,
            open,
            high,
            low,
            close,
        })
    }
}

/// Metrics computed from a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub upward_move: f64,
    pub upward_move_pct: f64,
    pub daily_range: f64,
}

impl DerivedMetrics {
    pub fn from_bar(bar: &PriceBar) -> Self {
        let upward_move = bar.high - bar.low;
        let pct = upward_move / bar.low * 100.0;
        let upward_move_pct = if bar.low == 0.0 || !pct.is_finite() {
            0.0
        } else {
            pct
        };

        Self {
            upward_move,
            upward_move_pct,
            daily_range: bar.close - bar.open,
        }
    }
}

/// A price bar together with its derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

impl MetricsRow {
    pub fn from_bar(bar: PriceBar) -> Self {
        Self {
            metrics: DerivedMetrics::from_bar(&bar),
            bar,
        }
    }

    pub fn date(&self) -> Date {
        self.bar.date
    }
}

/// Outcome of a single-ticker fetch.
///
/// `Rows` is never empty and is ordered by ascending, unique date.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultSet {
    Rows(Vec<MetricsRow>),
    #[default]
    NoData,
}

impl ResultSet {
    pub(crate) fn from_rows(rows: Vec<MetricsRow>) -> Self {
        if rows.is_empty() {
            Self::NoData
        } else {
            Self::Rows(rows)
        }
    }

    pub fn rows(&self) -> &[MetricsRow] {
        match self {
            Self::Rows(rows) => rows,
            Self::NoData => &[],
        }
    }

    pub fn into_rows(self) -> Vec<MetricsRow> {
        match self {
            Self::Rows(rows) => rows,
            Self::NoData => Vec::new(),
        }
    }

    pub fn latest(&self) -> Option<&MetricsRow> {
        self.rows().last()
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}
