//! Price source adapters.

pub mod yahoo;

pub use yahoo::YahooChartSource;
