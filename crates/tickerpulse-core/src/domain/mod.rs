//! # Domain Models
//!
//! Canonical types shared by the fetcher, the batch runner and the callers
//! that render or persist results.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated, upper-cased symbol |
//! | [`Period`] | Relative lookback (`30d`, `1mo`, `ytd`, ...) |
//! | [`Window`] | Relative period or explicit `[start, end)` date pair |
//! | [`FetchMode`] | Whole window or latest bar only |
//! | [`PriceBar`] | One trading day of OHLC prices |
//! | [`DerivedMetrics`] | Upward move, upward move %, daily range |
//! | [`MetricsRow`] | Bar plus metrics |
//! | [`ResultSet`] | Rows for one ticker, or the `NoData` outcome |

mod bar;
mod ticker;
mod window;

pub use bar::{DerivedMetrics, FetchMode, MetricsRow, PriceBar, ResultSet};
pub use ticker::Ticker;
pub use window::{format_date, parse_date, Period, Window};
