//! Derived views over a batch result.

use std::cmp::Ordering;

use crate::batch::{TickerRow, TickerTable};

/// Rows ranked by `upward_move_pct`, largest first, at most `n` of them.
///
/// Ties keep table order. NaN never appears in stored metrics, but would
/// sort last if it did.
pub fn top_movers(table: &TickerTable, n: usize) -> Vec<TickerRow> {
    let mut rows = table.rows();
    rows.sort_by(|a, b| compare_pct(b.row.metrics.upward_move_pct, a.row.metrics.upward_move_pct));
    rows.truncate(n);
    rows
}

fn compare_pct(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.total_cmp(&b),
    }
}
