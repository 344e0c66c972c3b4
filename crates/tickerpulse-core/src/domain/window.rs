use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

/// Lookback period understood by the chart endpoint, e.g. `30d` or `1y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
    YearToDate,
    Max,
}

impl Default for Period {
    fn default() -> Self {
        Self::Days(30)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{n}d"),
            Self::Weeks(n) => write!(f, "{n}wk"),
            Self::Months(n) => write!(f, "{n}mo"),
            Self::Years(n) => write!(f, "{n}y"),
            Self::YearToDate => f.write_str("ytd"),
            Self::Max => f.write_str("max"),
        }
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let invalid = || ValidationError::InvalidPeriod {
            value: value.to_owned(),
        };

        match normalized.as_str() {
            "ytd" => return Ok(Self::YearToDate),
            "max" => return Ok(Self::Max),
            _ => {}
        }

        let split = normalized
            .find(|ch: char| !ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (count, unit) = normalized.split_at(split);
        let count: u32 = count.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        match unit {
            "d" => Ok(Self::Days(count)),
            "wk" => Ok(Self::Weeks(count)),
            "mo" => Ok(Self::Months(count)),
            "y" => Ok(Self::Years(count)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

/// Date range requested from a price source.
///
/// `Explicit` is half-open: `start` is included, `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Relative(Period),
    Explicit { start: Date, end: Date },
}

impl Default for Window {
    fn default() -> Self {
        Self::Relative(Period::default())
    }
}

impl Window {
    pub fn explicit(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyWindow {
                start: format_date(start),
                end: format_date(end),
            });
        }
        Ok(Self::Explicit { start, end })
    }

    /// Pick the window for a request. A complete start/end pair wins over the
    /// relative period; a lone start or end is ignored.
    pub fn resolve(
        period: Period,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Self, ValidationError> {
        match (start, end) {
            (Some(start), Some(end)) => Self::explicit(start, end),
            _ => Ok(Self::Relative(period)),
        }
    }

    /// Stable textual form used in cache keys and logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Relative(period) => period.to_string(),
            Self::Explicit { start, end } => {
                format!("{}..{}", format_date(*start), format_date(*end))
            }
        }
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}
