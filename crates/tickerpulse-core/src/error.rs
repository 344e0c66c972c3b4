use thiserror::Error;

/// Validation and contract errors exposed by `tickerpulse-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter, digit or '^': '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("invalid period '{value}', expected e.g. 5d, 2wk, 1mo, 1y, ytd or max")]
    InvalidPeriod { value: String },
    #[error("date must be formatted YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("window start {start} must be before end {end}")]
    EmptyWindow { start: String, end: String },

    #[error("retry policy needs at least one attempt")]
    ZeroAttempts,
    #[error("concurrency limit must be greater than zero")]
    ZeroConcurrency,
    #[error("cache ttl {secs} s exceeds max {max} s")]
    CacheTtlTooLong { secs: u64, max: u64 },
}
