//! Transit line types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Vehicle mode of a line, used to pick the travel and boarding costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    /// Rail rapid transit. Cheaper to board and ride than surface lines.
    Metro,
    /// Surface lines (bus, tram, trolleybus).
    Bus,
}

impl fmt::Display for LineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineMode::Metro => f.write_str("metro"),
            LineMode::Bus => f.write_str("bus"),
        }
    }
}

/// A line as it appears in the routing graph.
///
/// Lines are keyed by their normalized short name (trimmed, uppercased),
/// so several feed routes sharing a short name collapse into one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Normalized short name, e.g. `M2` or `N101`.
    pub name: String,
    pub mode: LineMode,
    /// Runs only overnight.
    pub night_only: bool,
    /// Runs through the night on a modified schedule as well as by day.
    pub all_night: bool,
}

impl Line {
    /// Lines that may be boarded by a night-mode query.
    pub fn night_eligible(&self) -> bool {
        self.night_only || self.all_night
    }

    /// Lines that may be boarded by a day-mode query.
    pub fn day_eligible(&self) -> bool {
        !self.night_only
    }
}

/// Normalize a route short name into a line key.
pub fn normalize_line_name(short_name: &str) -> String {
    short_name.trim().to_uppercase()
}
