//! Nearest-stop lookup.

use tracing::trace;

use crate::domain::Coordinates;

use super::registry::{StopIndex, StopRegistry};

/// Default half-width of the candidate window, in degrees.
pub const DEFAULT_SEARCH_WINDOW_DEG: f64 = 0.02;

/// The stop resolution failed because there are no stops at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no stops loaded: cannot resolve coordinates to a stop")]
pub struct StopResolutionFailure;

/// A resolved stop and its great-circle distance from the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestStop {
    pub index: StopIndex,
    pub distance_m: f64,
}

/// Find the stop closest to `point`.
///
/// Only stops within `window_deg` degrees of the point on both axes are
/// considered; when that window is empty every stop is. Ties go to the stop
/// registered first.
pub fn nearest_stop(
    registry: &StopRegistry,
    point: Coordinates,
    window_deg: f64,
) -> Result<NearestStop, StopResolutionFailure> {
    let windowed = closest(
        registry
            .iter()
            .filter(|(_, stop)| point.within_window(&stop.location, window_deg)),
        point,
    );

    let found = match windowed {
        Some(found) => found,
        None => {
            trace!(%point, window_deg, "no stop inside search window, scanning all stops");
            closest(registry.iter(), point).ok_or(StopResolutionFailure)?
        }
    };

    Ok(found)
}

fn closest<'a>(
    candidates: impl Iterator<Item = (StopIndex, &'a crate::domain::Stop)>,
    point: Coordinates,
) -> Option<NearestStop> {
    let mut best: Option<NearestStop> = None;
    for (index, stop) in candidates {
        let distance_m = point.distance_m(&stop.location);
        // Strict comparison keeps the first of equally distant stops
        if best.is_none_or(|b| distance_m < b.distance_m) {
            best = Some(NearestStop { index, distance_m });
        }
    }
    best
}
