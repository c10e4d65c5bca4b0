//! Static transit feed access.
//!
//! The graph builder depends only on the shape of four relations (stops,
//! routes, trips and stop times), not on how they are stored. A
//! [`TransitFeed`] supplies them; [`GtfsDirectory`] reads a GTFS directory
//! and [`InMemoryFeed`] serves fixtures.

mod error;
mod gtfs;
mod memory;

pub use error::DataSourceError;
pub use gtfs::GtfsDirectory;
pub use memory::InMemoryFeed;

/// A row of the stops relation.
///
/// Coordinates are optional because feeds do publish stops without them;
/// such rows are skipped by the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRow {
    pub stop_id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A row of the routes relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRow {
    pub route_id: String,
    pub short_name: String,
}

/// A row of the trips relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRow {
    pub trip_id: String,
    pub route_id: String,
}

/// A row of the stop times relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimeRow {
    pub trip_id: String,
    pub stop_id: String,
    pub sequence: u32,
    pub arrival: Option<String>,
    pub departure: Option<String>,
}

/// Read-only access to a static transit feed.
///
/// Each relation is queried once per graph build. Implementations may block
/// on I/O; the engine calls them from a blocking worker thread.
pub trait TransitFeed: Send + Sync {
    /// All stops.
    fn stops(&self) -> Result<Vec<StopRow>, DataSourceError>;

    /// All routes.
    fn routes(&self) -> Result<Vec<RouteRow>, DataSourceError>;

    /// All trips.
    fn trips(&self) -> Result<Vec<TripRow>, DataSourceError>;

    /// All scheduled stop times.
    fn stop_times(&self) -> Result<Vec<StopTimeRow>, DataSourceError>;

    /// Short description of the source, for logs.
    fn describe(&self) -> String {
        "transit feed".to_string()
    }
}
