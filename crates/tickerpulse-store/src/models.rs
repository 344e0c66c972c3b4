use serde::{Deserialize, Serialize};
use tickerpulse_core::{
    format_date, parse_date, DerivedMetrics, MetricsRow, PriceBar, ValidationError,
};

/// Flat CSV record; field order is the column order on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub upward_move: f64,
    pub upward_move_pct: f64,
    pub daily_range: f64,
}

pub const COLUMNS: [&str; 8] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "upward_move",
    "upward_move_pct",
    "daily_range",
];

impl From<&MetricsRow> for StoredRow {
    fn from(row: &MetricsRow) -> Self {
        Self {
            date: format_date(row.bar.date),
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close: row.bar.close,
            upward_move: row.metrics.upward_move,
            upward_move_pct: row.metrics.upward_move_pct,
            daily_range: row.metrics.daily_range,
        }
    }
}

impl StoredRow {
    /// Rebuild a metrics row; stored metrics are kept as written.
    pub fn into_metrics_row(self) -> Result<MetricsRow, ValidationError> {
        let date = parse_date(&self.date)?;
        Ok(MetricsRow {
            bar: PriceBar {
                date,
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            },
            metrics: DerivedMetrics {
                upward_move: self.upward_move,
                upward_move_pct: self.upward_move_pct,
                daily_range: self.daily_range,
            },
        })
    }
}
