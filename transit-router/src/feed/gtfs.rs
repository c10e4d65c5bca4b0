//! GTFS directory reader.
//!
//! Reads `stops.txt`, `routes.txt`, `trips.txt` and `stop_times.txt` from
//! an unpacked GTFS feed. Rows that fail to deserialize are skipped and
//! counted; a missing file is an error.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::DataSourceError;
use super::{RouteRow, StopRow, StopTimeRow, TransitFeed, TripRow};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GtfsStop {
    stop_id: String,
    stop_name: String,
    stop_lat: String,
    stop_lon: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GtfsRoute {
    route_id: String,
    route_short_name: String,
    route_long_name: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GtfsTrip {
    trip_id: String,
    route_id: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GtfsStopTime {
    trip_id: String,
    stop_id: String,
    stop_sequence: String,
    arrival_time: String,
    departure_time: String,
}

/// A GTFS feed unpacked into a directory.
#[derive(Debug, Clone)]
pub struct GtfsDirectory {
    dir: PathBuf,
}

impl GtfsDirectory {
    /// Create a reader for the given directory.
    ///
    /// The directory is not touched until a relation is requested.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The feed directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(
        &self,
        relation: &'static str,
        file: &str,
    ) -> Result<Vec<T>, DataSourceError> {
        if !self.dir.is_dir() {
            return Err(DataSourceError::Unreachable {
                message: format!("GTFS directory not found: {}", self.dir.display()),
            });
        }

        let path = self.dir.join(file);
        let file = File::open(&path).map_err(|source| DataSourceError::Io { relation, source })?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        // A broken header row makes every record meaningless
        reader
            .headers()
            .map_err(|source| DataSourceError::Csv { relation, source })?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in reader.deserialize::<T>() {
            match record {
                Ok(row) => rows.push(row),
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(relation, skipped, "skipped undecodable GTFS rows");
        }
        debug!(relation, rows = rows.len(), path = %path.display(), "read GTFS relation");
        Ok(rows)
    }
}

impl TransitFeed for GtfsDirectory {
    fn stops(&self) -> Result<Vec<StopRow>, DataSourceError> {
        let stops: Vec<GtfsStop> = self.read("stops", "stops.txt")?;
        Ok(stops
            .into_iter()
            .map(|s| StopRow {
                stop_id: s.stop_id,
                name: s.stop_name,
                lat: s.stop_lat.parse().ok(),
                lon: s.stop_lon.parse().ok(),
            })
            .collect())
    }

    fn routes(&self) -> Result<Vec<RouteRow>, DataSourceError> {
        let routes: Vec<GtfsRoute> = self.read("routes", "routes.txt")?;
        Ok(routes
            .into_iter()
            .map(|r| {
                // Feeds may leave the short name blank and only fill the long name
                let short_name = if r.route_short_name.is_empty() {
                    r.route_long_name
                } else {
                    r.route_short_name
                };
                RouteRow {
                    route_id: r.route_id,
                    short_name,
                }
            })
            .collect())
    }

    fn trips(&self) -> Result<Vec<TripRow>, DataSourceError> {
        let trips: Vec<GtfsTrip> = self.read("trips", "trips.txt")?;
        Ok(trips
            .into_iter()
            .map(|t| TripRow {
                trip_id: t.trip_id,
                route_id: t.route_id,
            })
            .collect())
    }

    fn stop_times(&self) -> Result<Vec<StopTimeRow>, DataSourceError> {
        let times: Vec<GtfsStopTime> = self.read("stop_times", "stop_times.txt")?;
        let total = times.len();
        let rows: Vec<StopTimeRow> = times
            .into_iter()
            .filter_map(|t| {
                let sequence = t.stop_sequence.parse().ok()?;
                Some(StopTimeRow {
                    trip_id: t.trip_id,
                    stop_id: t.stop_id,
                    sequence,
                    arrival: non_empty(t.arrival_time),
                    departure: non_empty(t.departure_time),
                })
            })
            .collect();

        if rows.len() < total {
            warn!(
                skipped = total - rows.len(),
                "skipped stop times without a numeric stop_sequence"
            );
        }
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("GTFS directory {}", self.dir.display())
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
