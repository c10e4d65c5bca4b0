//! Turning an edge path into a traveller-facing itinerary.

use serde::Serialize;

use crate::domain::{Coordinates, LineMode, TimeMode, format_duration, whole_minutes};
use crate::network::{EdgeIndex, EdgeKind, Network, TransferKind};
use crate::stations::StopIndex;

/// One step of an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItineraryLeg {
    /// A ride on one line.
    Transit {
        line: String,
        mode: LineMode,
        /// Name of the stop where the ride starts.
        from: String,
        duration_minutes: f64,
        duration: String,
        /// Number of hops ridden.
        stops_count: u32,
    },
    /// One or more consecutive walks.
    Transfer {
        kind: TransferKind,
        label: String,
        /// Name of the stop where the walk ends.
        to: String,
        duration_minutes: f64,
        duration: String,
    },
}

impl ItineraryLeg {
    pub fn duration_minutes(&self) -> f64 {
        match self {
            ItineraryLeg::Transit {
                duration_minutes, ..
            }
            | ItineraryLeg::Transfer {
                duration_minutes, ..
            } => *duration_minutes,
        }
    }
}

/// A route from one stop to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub legs: Vec<ItineraryLeg>,
    /// Stop coordinates along the route, without consecutive repeats.
    pub path: Vec<Coordinates>,
    pub start_stop: String,
    pub end_stop: String,
    pub total_duration: String,
    /// Whole minutes, rounded up like `total_duration` rather than truncated.
    pub total_minutes: u32,
    /// Number of changes between lines.
    pub changes: usize,
    pub time_mode: TimeMode,
}

impl Itinerary {
    /// An itinerary that stays at one stop.
    pub(crate) fn stationary(network: &Network, stop: StopIndex, time_mode: TimeMode) -> Self {
        let (name, path) = match network.stops().get(stop) {
            Some(stop) => (stop.name.clone(), vec![stop.location]),
            None => (String::new(), Vec::new()),
        };
        Self {
            legs: Vec::new(),
            path,
            start_stop: name.clone(),
            end_stop: name,
            total_duration: format_duration(0.0),
            total_minutes: 0,
            changes: 0,
            time_mode,
        }
    }

    /// Fold an edge path into legs.
    ///
    /// Consecutive travel edges on one line become a single transit leg and
    /// consecutive walks a single transfer leg. Boarding and alighting only
    /// count towards the total.
    pub(crate) fn from_path(
        network: &Network,
        start: StopIndex,
        end: StopIndex,
        path: &[EdgeIndex],
        time_mode: TimeMode,
    ) -> Self {
        let graph = network.graph();
        let stop_name = |stop: StopIndex| {
            network
                .stops()
                .get(stop)
                .map(|s| s.name.clone())
                .unwrap_or_default()
        };

        let mut legs: Vec<ItineraryLeg> = Vec::new();
        let mut stops = vec![start];
        let mut total = 0.0;

        for edge in path.iter().filter_map(|&index| graph.edge(index)) {
            total += edge.minutes;

            let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
                continue;
            };
            if stops.last() != Some(&to.stop()) {
                stops.push(to.stop());
            }

            match edge.kind {
                EdgeKind::Travel => {
                    let line = graph.line_name(edge).unwrap_or_default();
                    if let Some(ItineraryLeg::Transit {
                        line: current,
                        duration_minutes,
                        duration,
                        stops_count,
                        ..
                    }) = legs.last_mut()
                        && current.as_str() == line
                    {
                        *duration_minutes += edge.minutes;
                        *duration = format_duration(*duration_minutes);
                        *stops_count += 1;
                    } else {
                        legs.push(ItineraryLeg::Transit {
                            line: line.to_string(),
                            mode: edge
                                .line
                                .and_then(|l| graph.line(l))
                                .map_or(LineMode::Bus, |l| l.mode),
                            from: stop_name(from.stop()),
                            duration_minutes: edge.minutes,
                            duration: format_duration(edge.minutes),
                            stops_count: 1,
                        });
                    }
                }
                EdgeKind::Walk(kind) => {
                    if let Some(ItineraryLeg::Transfer {
                        to: destination,
                        duration_minutes,
                        duration,
                        ..
                    }) = legs.last_mut()
                    {
                        *duration_minutes += edge.minutes;
                        *duration = format_duration(*duration_minutes);
                        *destination = stop_name(to.stop());
                    } else {
                        legs.push(ItineraryLeg::Transfer {
                            kind,
                            label: transfer_label(kind).to_string(),
                            to: stop_name(to.stop()),
                            duration_minutes: edge.minutes,
                            duration: format_duration(edge.minutes),
                        });
                    }
                }
                EdgeKind::Board | EdgeKind::Alight => {}
            }
        }

        let transit_legs = legs
            .iter()
            .filter(|leg| matches!(leg, ItineraryLeg::Transit { .. }))
            .count();

        Self {
            legs,
            path: stops
                .iter()
                .filter_map(|&stop| network.stops().get(stop))
                .map(|stop| stop.location)
                .collect(),
            start_stop: stop_name(start),
            end_stop: stop_name(end),
            total_duration: format_duration(total),
            total_minutes: whole_minutes(total),
            changes: transit_legs.saturating_sub(1),
            time_mode,
        }
    }
}

fn transfer_label(kind: TransferKind) -> &'static str {
    match kind {
        TransferKind::Rapid => "Rapid transfer",
        TransferKind::Street => "Walk",
    }
}
