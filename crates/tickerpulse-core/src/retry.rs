//! Retry policy for single-ticker fetches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Backoff shape as named in configuration (`retry_backoff`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Wait between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same wait after every failure.
    Fixed(Duration),
    /// Ceiling doubles from `initial` after each failure, capped at `cap`.
    /// The actual wait is drawn from the upper half of the ceiling.
    Doubling { initial: Duration, cap: Duration },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed(Duration::from_secs(5))
    }
}

impl Backoff {
    /// Wait after failed attempt `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => delay,
            Self::Doubling { initial, cap } => {
                let ceiling = Self::ceiling(initial, cap, attempt);
                let scale = 0.5 + fastrand::f64() * 0.5;
                Duration::try_from_secs_f64(ceiling.as_secs_f64() * scale)
                    .map_or(ceiling, |delay| delay.min(ceiling))
            }
        }
    }

    fn ceiling(initial: Duration, cap: Duration, attempt: u32) -> Duration {
        let factor = 1_u32 << attempt.min(31);
        initial.saturating_mul(factor).min(cap)
    }
}

/// How many times a fetch is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Result<Self, ValidationError> {
        if max_attempts == 0 {
            return Err(ValidationError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            backoff,
        })
    }

    /// Fixed delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Result<Self, ValidationError> {
        Self::new(max_attempts, Backoff::Fixed(delay))
    }

    /// A single attempt, no waiting.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Delay to wait after the given failed attempt (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}
