//! Route queries against a loaded network.

use tracing::{debug, trace};

use crate::domain::{Coordinates, TimeMode};
use crate::network::Network;
use crate::stations::{StopResolutionFailure, nearest_stop};

use super::config::RouterConfig;
use super::dijkstra::shortest_path;
use super::itinerary::Itinerary;

/// Error from a route query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The destination cannot be reached at the requested time
    #[error("no route found")]
    NoRouteFound,

    /// The coordinates could not be resolved to stops
    #[error(transparent)]
    StopResolution(#[from] StopResolutionFailure),

    /// No network has been loaded yet
    #[error("routing network is not loaded yet")]
    NotReady,
}

/// Answers route queries over one network.
///
/// Holds no state between queries.
#[derive(Debug, Clone, Copy)]
pub struct Router<'a> {
    network: &'a Network,
    config: &'a RouterConfig,
}

impl<'a> Router<'a> {
    pub fn new(network: &'a Network, config: &'a RouterConfig) -> Self {
        Self { network, config }
    }

    /// Find the best route between two points.
    ///
    /// Each point is resolved to its nearest stop. The optional ISO-8601
    /// `query_time` selects the day or night network.
    pub fn find_route(
        &self,
        start: Coordinates,
        end: Coordinates,
        query_time: Option<&str>,
    ) -> Result<Itinerary, RouteError> {
        let mode = TimeMode::for_query(query_time, &self.config.night_window);
        let stops = self.network.stops();
        let window = self.config.search_window_deg;

        let from = nearest_stop(stops, start, window)?;
        let to = nearest_stop(stops, end, window)?;
        debug!(
            %mode,
            from = %from.index,
            from_distance_m = from.distance_m,
            to = %to.index,
            to_distance_m = to.distance_m,
            "resolved query stops"
        );

        if from.index == to.index {
            return Ok(Itinerary::stationary(self.network, from.index, mode));
        }

        let graph = self.network.graph();
        let (Some(source), Some(target)) = (graph.physical(from.index), graph.physical(to.index))
        else {
            return Err(RouteError::NoRouteFound);
        };

        let path = shortest_path(graph, source, target, mode).ok_or(RouteError::NoRouteFound)?;
        trace!(edges = path.len(), "found path");

        let itinerary = Itinerary::from_path(self.network, from.index, to.index, &path, mode);
        debug!(
            legs = itinerary.legs.len(),
            minutes = itinerary.total_minutes,
            changes = itinerary.changes,
            "route found"
        );
        Ok(itinerary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineMode;
    use crate::feed::InMemoryFeed;
    use crate::network::{BuildControl, BuildPolicy, TransferKind, build};
    use crate::planner::ItineraryLeg;

    fn at(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    /// Four stops about 2.2 km apart on a north-south axis.
    fn corridor() -> InMemoryFeed {
        InMemoryFeed::new()
            .with_stop("A", "Alpha", 44.40, 26.00)
            .with_stop("B", "Bravo", 44.42, 26.00)
            .with_stop("C", "Charlie", 44.44, 26.00)
            .with_stop("D", "Delta", 44.46, 26.00)
    }

    fn network(feed: InMemoryFeed) -> Network {
        build(&feed, &BuildPolicy::default(), &BuildControl::new()).unwrap()
    }

    fn route(
        network: &Network,
        from: Coordinates,
        to: Coordinates,
        at_time: Option<&str>,
    ) -> Result<Itinerary, RouteError> {
        Router::new(network, &RouterConfig::default()).find_route(from, to, at_time)
    }

    fn lines(itinerary: &Itinerary) -> Vec<&str> {
        itinerary
            .legs
            .iter()
            .filter_map(|leg| match leg {
                ItineraryLeg::Transit { line, .. } => Some(line.as_str()),
                ItineraryLeg::Transfer { .. } => None,
            })
            .collect()
    }

    #[test]
    fn consecutive_hops_merge_into_one_leg() {
        let net = network(corridor().with_line("M2", &["A", "B", "C", "D"]));
        let it = route(&net, at(44.40, 26.00), at(44.46, 26.00), None).unwrap();

        assert_eq!(it.legs.len(), 1);
        let ItineraryLeg::Transit {
            line,
            mode,
            from,
            duration_minutes,
            duration,
            stops_count,
        } = &it.legs[0]
        else {
            panic!("expected a transit leg, got {:?}", it.legs[0]);
        };
        assert_eq!(line, "M2");
        assert_eq!(*mode, LineMode::Metro);
        assert_eq!(from, "Alpha");
        assert_eq!(*stops_count, 3);
        assert_eq!(*duration_minutes, 7.5);
        assert_eq!(duration, "8 min");

        // 5 min wait, 3 x 2.5 min riding, 0.5 min alighting
        assert_eq!(it.total_minutes, 13);
        assert_eq!(it.total_duration, "13 min");
        assert_eq!(it.changes, 0);
        assert_eq!(it.start_stop, "Alpha");
        assert_eq!(it.end_stop, "Delta");
        assert_eq!(it.path.len(), 4);
        assert_eq!(it.time_mode, TimeMode::Day);
    }

    #[test]
    fn total_minutes_round_up() {
        let net = network(corridor().with_line("M2", &["A", "B", "C"]));
        let it = route(&net, at(44.40, 26.00), at(44.44, 26.00), None).unwrap();

        // 5 + 2 x 2.5 + 0.5 = 10.5 minutes
        assert_eq!(it.total_minutes, 11);
        assert_eq!(it.total_duration, "11 min");
    }

    #[test]
    fn night_query_uses_night_lines_only() {
        let net = network(
            corridor()
                .with_line("336", &["A", "C"])
                .with_line("N101", &["A", "B", "C"]),
        );
        let (from, to) = (at(44.40, 26.00), at(44.44, 26.00));

        let day = route(&net, from, to, Some("2025-12-07T14:00:00")).unwrap();
        assert_eq!(day.time_mode, TimeMode::Day);
        assert_eq!(lines(&day), vec!["336"]);

        let night = route(&net, from, to, Some("2025-12-07T02:00:00")).unwrap();
        assert_eq!(night.time_mode, TimeMode::Night);
        assert_eq!(lines(&night), vec!["N101"]);
    }

    #[test]
    fn night_line_is_unusable_by_day() {
        let net = network(corridor().with_line("N101", &["A", "B"]));
        let result = route(&net, at(44.40, 26.00), at(44.42, 26.00), Some("2025-12-07T14:00"));
        assert_eq!(result, Err(RouteError::NoRouteFound));
    }

    #[test]
    fn day_line_is_unusable_at_night() {
        let net = network(corridor().with_line("104", &["A", "B"]));
        let result = route(&net, at(44.40, 26.00), at(44.42, 26.00), Some("2025-12-07T23:30"));
        assert_eq!(result, Err(RouteError::NoRouteFound));
    }

    #[test]
    fn all_night_line_runs_day_and_night() {
        let net = network(corridor().with_line("783", &["A", "B"]));
        let (from, to) = (at(44.40, 26.00), at(44.42, 26.00));
        assert!(route(&net, from, to, Some("2025-12-07T03:00")).is_ok());
        assert!(route(&net, from, to, Some("2025-12-07T12:00")).is_ok());
        assert!(route(&net, from, to, None).is_ok());
    }

    #[test]
    fn same_stop_gives_empty_itinerary() {
        let net = network(corridor().with_line("M2", &["A", "B"]));
        let it = route(&net, at(44.4001, 26.0001), at(44.3999, 25.9999), None).unwrap();

        assert!(it.legs.is_empty());
        assert_eq!(it.total_minutes, 0);
        assert_eq!(it.total_duration, "0 min");
        assert_eq!(it.path, vec![at(44.40, 26.00)]);
        assert_eq!(it.start_stop, "Alpha");
        assert_eq!(it.end_stop, "Alpha");
    }

    #[test]
    fn unreachable_destination() {
        let net = network(corridor().with_line("M2", &["B", "A"]));
        let result = route(&net, at(44.40, 26.00), at(44.42, 26.00), None);
        assert_eq!(result, Err(RouteError::NoRouteFound));
    }

    #[test]
    fn empty_network_cannot_resolve_stops() {
        let result = route(&Network::default(), at(44.40, 26.00), at(44.42, 26.00), None);
        assert_eq!(result, Err(RouteError::StopResolution(StopResolutionFailure)));
    }

    #[test]
    fn walks_become_transfer_legs() {
        // "Xray" is 55 m from "Alpha", close enough for a street walk
        let net = network(
            corridor()
                .with_stop("X", "Xray", 44.4005, 26.00)
                .with_line("M2", &["A", "B", "C"]),
        );
        let it = route(&net, at(44.4005, 26.00), at(44.44, 26.00), None).unwrap();

        assert_eq!(it.start_stop, "Xray");
        assert_eq!(it.legs.len(), 2);
        match &it.legs[0] {
            ItineraryLeg::Transfer { kind, label, to, .. } => {
                assert_eq!(*kind, TransferKind::Street);
                assert_eq!(label, "Walk");
                assert_eq!(to, "Alpha");
            }
            other => panic!("expected a transfer leg, got {other:?}"),
        }
        assert_eq!(lines(&it), vec!["M2"]);
        assert_eq!(it.path.len(), 4);
    }

    #[test]
    fn changes_count_transit_legs() {
        let net = network(
            corridor()
                .with_line("M2", &["A", "B"])
                .with_line("M3", &["B", "C"]),
        );
        let it = route(&net, at(44.40, 26.00), at(44.44, 26.00), None).unwrap();
        assert_eq!(lines(&it), vec!["M2", "M3"]);
        assert_eq!(it.changes, 1);
        // Two waits, two rides, two alightings
        assert_eq!(it.total_minutes, 16);
        assert_eq!(it.path.len(), 3);
    }

    #[test]
    fn total_is_at_least_the_sum_of_legs() {
        let net = network(
            corridor()
                .with_stop("X", "Xray", 44.4005, 26.00)
                .with_line("104", &["A", "B", "C", "D"]),
        );
        let it = route(&net, at(44.4005, 26.00), at(44.46, 26.00), None).unwrap();
        let legs: f64 = it.legs.iter().map(ItineraryLeg::duration_minutes).sum();
        assert!(f64::from(it.total_minutes) >= legs);
    }
}
