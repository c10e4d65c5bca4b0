//! In-memory feed for fixtures and tests.

use super::error::DataSourceError;
use super::{RouteRow, StopRow, StopTimeRow, TransitFeed, TripRow};

/// A feed held entirely in memory.
///
/// Built with a fluent API; each [`with_line`](Self::with_line) call adds
/// one route with a single trip calling at the given stops in order.
///
/// # Examples
///
/// ```
/// use transit_router::feed::{InMemoryFeed, TransitFeed};
///
/// let feed = InMemoryFeed::new()
///     .with_stop("A", "Alpha", 44.40, 26.10)
///     .with_stop("B", "Beta", 44.41, 26.10)
///     .with_line("M1", &["A", "B"]);
///
/// assert_eq!(feed.stops().unwrap().len(), 2);
/// assert_eq!(feed.stop_times().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeed {
    stops: Vec<StopRow>,
    routes: Vec<RouteRow>,
    trips: Vec<TripRow>,
    stop_times: Vec<StopTimeRow>,
    unreachable: Option<String>,
}

impl InMemoryFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a feed whose every query fails as unreachable.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            unreachable: Some(message.into()),
            ..Self::default()
        }
    }

    /// Add a stop with coordinates.
    pub fn with_stop(mut self, id: &str, name: &str, lat: f64, lon: f64) -> Self {
        self.stops.push(StopRow {
            stop_id: id.to_string(),
            name: name.to_string(),
            lat: Some(lat),
            lon: Some(lon),
        });
        self
    }

    /// Add a raw stop row, e.g. one without coordinates.
    pub fn with_stop_row(mut self, row: StopRow) -> Self {
        self.stops.push(row);
        self
    }

    /// Add a route with one trip calling at `stop_ids` in order.
    pub fn with_line(mut self, short_name: &str, stop_ids: &[&str]) -> Self {
        let n = self.routes.len() + 1;
        let route_id = format!("R{n}");
        let trip_id = format!("T{n}");

        self.routes.push(RouteRow {
            route_id: route_id.clone(),
            short_name: short_name.to_string(),
        });
        self.trips.push(TripRow {
            trip_id: trip_id.clone(),
            route_id,
        });
        for (i, stop_id) in stop_ids.iter().enumerate() {
            self.stop_times.push(StopTimeRow {
                trip_id: trip_id.clone(),
                stop_id: (*stop_id).to_string(),
                sequence: i as u32 + 1,
                arrival: None,
                departure: None,
            });
        }
        self
    }

    /// Add a raw stop time row.
    pub fn with_stop_time(mut self, row: StopTimeRow) -> Self {
        self.stop_times.push(row);
        self
    }

    fn check(&self) -> Result<(), DataSourceError> {
        match &self.unreachable {
            Some(message) => Err(DataSourceError::Unreachable {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TransitFeed for InMemoryFeed {
    fn stops(&self) -> Result<Vec<StopRow>, DataSourceError> {
        self.check()?;
        Ok(self.stops.clone())
    }

    fn routes(&self) -> Result<Vec<RouteRow>, DataSourceError> {
        self.check()?;
        Ok(self.routes.clone())
    }

    fn trips(&self) -> Result<Vec<TripRow>, DataSourceError> {
        self.check()?;
        Ok(self.trips.clone())
    }

    fn stop_times(&self) -> Result<Vec<StopTimeRow>, DataSourceError> {
        self.check()?;
        Ok(self.stop_times.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory feed ({} stops)", self.stops.len())
    }
}
