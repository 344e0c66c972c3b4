//! # tickerpulse store
//!
//! Incremental per-ticker history on disk. Each ticker lives in its own
//! `<TICKER>.csv` file under the store directory, with the columns
//! `date,open,high,low,close,upward_move,upward_move_pct,daily_range`.
//!
//! Appends never duplicate a date, and [`CsvStore::next_window`] reports the
//! range still missing so a sync only fetches new sessions.
//!
//! ```rust,no_run
//! use tickerpulse_core::{Period, Ticker};
//! use tickerpulse_store::CsvStore;
//! use time::macros::date;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CsvStore::open("data")?;
//! let aapl = Ticker::parse("AAPL")?;
//! let window = store.next_window(&aapl, date!(2024 - 03 - 01), Period::Years(1))?;
//! println!("next fetch: {window:?}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
mod store;

pub use error::StoreError;
pub use models::StoredRow;
pub use store::CsvStore;
