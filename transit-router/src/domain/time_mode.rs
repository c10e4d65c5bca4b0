//! Query-time service modes.
//!
//! A route query carries an optional ISO-8601 timestamp. Only its hour of
//! day matters: it selects between the day network and the night network.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Naive timestamp layouts accepted in addition to RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Which part of the network a query may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    Day,
    Night,
}

impl TimeMode {
    /// Determine the mode for an optional query timestamp.
    ///
    /// Missing or unparseable timestamps fall back to day mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::{NightWindow, TimeMode};
    ///
    /// let window = NightWindow::default();
    /// assert_eq!(TimeMode::for_query(Some("2025-12-07T02:00"), &window), TimeMode::Night);
    /// assert_eq!(TimeMode::for_query(Some("2025-12-07T14:30"), &window), TimeMode::Day);
    /// assert_eq!(TimeMode::for_query(Some("soon"), &window), TimeMode::Day);
    /// assert_eq!(TimeMode::for_query(None, &window), TimeMode::Day);
    /// ```
    pub fn for_query(query_time: Option<&str>, window: &NightWindow) -> Self {
        match query_time.and_then(query_hour) {
            Some(hour) if window.contains(hour) => TimeMode::Night,
            _ => TimeMode::Day,
        }
    }
}

impl fmt::Display for TimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeMode::Day => f.write_str("day"),
            TimeMode::Night => f.write_str("night"),
        }
    }
}

/// Hours of the day served by the night network.
///
/// The window is half-open, `[start_hour, end_hour)`, and wraps past
/// midnight when `start_hour > end_hour`. Equal bounds mean no night service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl NightWindow {
    /// Create a window from its bounds (hours 0-23).
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Whether `hour` falls inside the window.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 5,
        }
    }
}

/// Extract the local hour of day from an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (the hour is taken in the timestamp's own offset),
/// naive date-times with `T` or space separators, and bare dates, which
/// count as midnight.
pub fn query_hour(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.hour());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.hour());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(|_| 0)
}
