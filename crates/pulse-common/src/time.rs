//! Time window utilities
//!
//! Fetch runs operate over half-open intervals `[start, end)` so that
//! back-to-back windows never double-count a record sitting exactly on the
//! boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window; `start` must not be after `end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "time window start after end");
        Self { start, end }
    }

    /// Window of `minutes` length ending at `end`
    pub fn lookback(end: DateTime<Utc>, minutes: i64) -> Self {
        Self::new(end - Duration::minutes(minutes), end)
    }

    /// Whether `t` falls inside `[start, end)`
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Window length
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.to_rfc3339(),
            self.end.to_rfc3339()
        )
    }
}
