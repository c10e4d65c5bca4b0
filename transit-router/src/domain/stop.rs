//! Stop identity and location types.

use std::fmt;

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid stop id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// A stop identifier as published by the transit feed.
///
/// Feed ids are opaque strings. Surrounding whitespace is trimmed and the
/// empty string is rejected, so any `StopId` is a usable lookup key.
///
/// # Examples
///
/// ```
/// use transit_router::domain::StopId;
///
/// let id = StopId::parse(" 4021 ").unwrap();
/// assert_eq!(id.as_str(), "4021");
///
/// assert!(StopId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop id, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidStopId {
                reason: "must not be empty",
            });
        }
        Ok(StopId(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Create a coordinate pair, returning `None` when either component is
    /// non-finite or outside the valid latitude/longitude range.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    /// Great-circle distance to `other` in metres.
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        self.to_point().haversine_distance(&other.to_point())
    }

    /// Whether `other` lies within `window_deg` degrees on both axes.
    pub fn within_window(&self, other: &Coordinates, window_deg: f64) -> bool {
        (self.lat - other.lat).abs() < window_deg && (self.lon - other.lon).abs() < window_deg
    }

    fn to_point(self) -> Point<f64> {
        // geo points are (x = longitude, y = latitude)
        Point::new(self.lon, self.lat)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// A physical stop from the feed.
///
/// Stops are immutable once loaded and owned by the
/// [`StopRegistry`](crate::stations::StopRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub location: Coordinates,
}

impl Stop {
    /// Create a new stop.
    pub fn new(id: StopId, name: impl Into<String>, location: Coordinates) -> Self {
        Self {
            id,
            name: name.into(),
            location,
        }
    }
}
