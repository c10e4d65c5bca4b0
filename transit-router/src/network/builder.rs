//! Graph construction from a transit feed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::domain::{Coordinates, Stop, StopId, normalize_line_name};
use crate::feed::{DataSourceError, TransitFeed};
use crate::stations::{StopIndex, StopRegistry};
use crate::walkable::infer_transfers;

use super::graph::{Edge, EdgeKind, GraphBuilder, LineIndex, Node, NodeIndex};
use super::policy::{BuildPolicy, CostPolicy, ModeCosts};
use super::Network;

/// Errors that end a build without producing a network.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error("build aborted")]
    Aborted,
}

/// Cooperative abort switch shared between a running build and its owner.
///
/// Clones share the same switch.
#[derive(Debug, Clone, Default)]
pub struct BuildControl {
    aborted: Arc<AtomicBool>,
}

impl BuildControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the build to stop at its next checkpoint.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Clear a previous abort request.
    pub fn reset(&self) {
        self.aborted.store(false, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    fn checkpoint(&self, phase: &'static str) -> Result<(), BuildError> {
        if self.is_aborted() {
            info!(phase, "graph build aborted");
            return Err(BuildError::Aborted);
        }
        Ok(())
    }
}

/// One ride between consecutive calls of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Hop {
    from: StopIndex,
    to: StopIndex,
    line: String,
}

/// Build a network from a feed.
///
/// Malformed rows are skipped and counted; the build only fails when the
/// feed cannot be read, when no usable stops or hops remain, or when
/// `control` is aborted.
pub fn build(
    feed: &dyn TransitFeed,
    policy: &BuildPolicy,
    control: &BuildControl,
) -> Result<Network, BuildError> {
    info!(source = %feed.describe(), "building transit graph");

    control.checkpoint("stops")?;
    let registry = load_stops(feed)?;

    control.checkpoint("hops")?;
    let hops = derive_hops(feed, &registry)?;

    control.checkpoint("lines")?;
    let mut graph = GraphBuilder::new();
    for (index, _) in registry.iter() {
        graph.node(Node::Physical(index));
    }
    for hop in &hops {
        add_hop(&mut graph, hop, policy);
    }
    let line_edges = graph.edge_count();

    control.checkpoint("transfers")?;
    let transfers = infer_transfers(&mut graph, &registry, &policy.transfers);

    control.checkpoint("finish")?;
    let graph = graph.finish();
    info!(
        stops = registry.len(),
        hops = hops.len(),
        lines = graph.lines().len(),
        line_edges,
        rapid_transfers = transfers.rapid,
        street_transfers = transfers.street,
        "transit graph built"
    );

    Ok(Network {
        graph,
        stops: registry,
    })
}

fn load_stops(feed: &dyn TransitFeed) -> Result<StopRegistry, BuildError> {
    let rows = feed.stops()?;
    let total = rows.len();
    let mut registry = StopRegistry::new();
    let mut skipped = 0usize;

    for row in rows {
        let id = StopId::parse(&row.stop_id).ok();
        let location = row.lat.zip(row.lon).and_then(|(lat, lon)| Coordinates::new(lat, lon));
        let inserted = match (id, location) {
            (Some(id), Some(location)) => registry
                .insert(Stop::new(id, row.name.trim(), location))
                .is_some(),
            _ => false,
        };
        if !inserted {
            skipped += 1;
        }
    }

    if skipped > 0 {
        warn!(skipped, total, "skipped unusable stop rows");
    }
    if registry.is_empty() {
        return Err(DataSourceError::Empty { relation: "stops" }.into());
    }
    debug!(stops = registry.len(), "loaded stops");
    Ok(registry)
}

/// Derive distinct hops in first-seen order.
///
/// Calls of each trip are ordered by sequence number and every pair of
/// neighbouring calls is one hop. Trips are visited in id order.
fn derive_hops(feed: &dyn TransitFeed, registry: &StopRegistry) -> Result<Vec<Hop>, BuildError> {
    let lines: HashMap<String, String> = feed
        .routes()?
        .into_iter()
        .map(|route| {
            let mut name = normalize_line_name(&route.short_name);
            if name.is_empty() {
                name = normalize_line_name(&route.route_id);
            }
            (route.route_id, name)
        })
        .collect();

    let trip_lines: HashMap<String, &str> = feed
        .trips()?
        .into_iter()
        .filter_map(|trip| {
            let line = lines.get(&trip.route_id)?;
            Some((trip.trip_id, line.as_str()))
        })
        .collect();

    let mut calls: BTreeMap<String, Vec<(u32, StopIndex)>> = BTreeMap::new();
    let mut dangling = 0usize;
    for row in feed.stop_times()? {
        match (trip_lines.contains_key(&row.trip_id), registry.index_of_str(&row.stop_id)) {
            (true, Some(stop)) => calls.entry(row.trip_id).or_default().push((row.sequence, stop)),
            _ => dangling += 1,
        }
    }
    if dangling > 0 {
        warn!(dangling, "skipped stop times with unknown trip or stop");
    }

    let mut seen = HashSet::new();
    let mut hops = Vec::new();
    for (trip, mut trip_calls) in calls {
        let Some(&line) = trip_lines.get(&trip) else {
            continue;
        };
        trip_calls.sort_by_key(|&(sequence, _)| sequence);
        for pair in trip_calls.windows(2) {
            let (from, to) = (pair[0].1, pair[1].1);
            if from == to {
                continue;
            }
            let hop = Hop {
                from,
                to,
                line: line.to_string(),
            };
            if seen.insert(hop.clone()) {
                hops.push(hop);
            }
        }
    }

    if hops.is_empty() {
        return Err(DataSourceError::Empty {
            relation: "stop_times",
        }
        .into());
    }
    debug!(hops = hops.len(), "derived hops");
    Ok(hops)
}

/// A line as seen while adding its edges.
struct LineEdges {
    index: LineIndex,
    costs: ModeCosts,
    day_eligible: bool,
    night_eligible: bool,
}

fn add_hop(graph: &mut GraphBuilder, hop: &Hop, policy: &BuildPolicy) {
    let line = policy.lines.classify(&hop.line);
    let ctx = LineEdges {
        costs: *policy.costs.for_mode(line.mode),
        day_eligible: line.day_eligible(),
        night_eligible: line.night_eligible(),
        index: graph.line(line),
    };

    let from = line_stop(graph, hop.from, &ctx, &policy.costs);
    let to = line_stop(graph, hop.to, &ctx, &policy.costs);
    graph.add_edge(Edge {
        from,
        to,
        kind: EdgeKind::Travel,
        weight: ctx.costs.travel_weight,
        minutes: ctx.costs.travel_minutes,
        line: Some(ctx.index),
        night_eligible: ctx.night_eligible,
        day_eligible: ctx.day_eligible,
    });
}

/// Get or create the node for riding a line at `stop`.
///
/// A new node gets its board edge from, and its alight edge to, the stop's
/// physical node.
fn line_stop(graph: &mut GraphBuilder, stop: StopIndex, ctx: &LineEdges, costs: &CostPolicy) -> NodeIndex {
    let key = Node::LineStop(stop, ctx.index);
    if let Some(index) = graph.node_index(&key) {
        return index;
    }
    let physical = graph.node(Node::Physical(stop));
    let aboard = graph.node(key);

    graph.add_edge(Edge {
        from: physical,
        to: aboard,
        kind: EdgeKind::Board,
        weight: ctx.costs.board_weight,
        minutes: ctx.costs.board_minutes,
        line: Some(ctx.index),
        night_eligible: ctx.night_eligible,
        day_eligible: ctx.day_eligible,
    });
    graph.add_edge(Edge {
        from: aboard,
        to: physical,
        kind: EdgeKind::Alight,
        weight: costs.alight_weight,
        minutes: costs.alight_minutes,
        line: Some(ctx.index),
        night_eligible: ctx.night_eligible,
        day_eligible: ctx.day_eligible,
    });
    aboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineMode;
    use crate::feed::{InMemoryFeed, StopRow, StopTimeRow};
    use crate::network::{TransferKind, TransitGraph};

    fn build_default(feed: &InMemoryFeed) -> Result<Network, BuildError> {
        build(feed, &BuildPolicy::default(), &BuildControl::new())
    }

    /// Stops far enough apart that no transfers are inferred.
    fn line_feed() -> InMemoryFeed {
        InMemoryFeed::new()
            .with_stop("A", "Alpha", 44.40, 26.00)
            .with_stop("B", "Bravo", 44.42, 26.02)
            .with_stop("C", "Charlie", 44.44, 26.04)
            .with_stop("D", "Delta", 44.46, 26.06)
    }

    fn line_stop_of(g: &TransitGraph, stop: u32, line: &str) -> NodeIndex {
        let line = g
            .lines()
            .iter()
            .position(|l| l.name == line)
            .expect("line exists");
        g.node_index(&Node::LineStop(StopIndex(stop), LineIndex(line as u32)))
            .expect("line stop exists")
    }

    #[test]
    fn builds_layered_edges() {
        let feed = line_feed().with_line("m2", &["A", "B", "C"]);
        let network = build_default(&feed).unwrap();
        let g = network.graph();

        assert_eq!(g.lines().len(), 1);
        assert_eq!(g.lines()[0].name, "M2");
        assert_eq!(g.lines()[0].mode, LineMode::Metro);
        // 4 physical + 3 line stops
        assert_eq!(g.node_count(), 7);

        let a = g.physical(StopIndex(0)).unwrap();
        let a_m2 = line_stop_of(g, 0, "M2");
        let b_m2 = line_stop_of(g, 1, "M2");

        let board = g.find_edge(a, a_m2).unwrap();
        assert_eq!(board.kind, EdgeKind::Board);
        assert_eq!((board.weight, board.minutes), (5.0, 5.0));

        let travel = g.find_edge(a_m2, b_m2).unwrap();
        assert_eq!(travel.kind, EdgeKind::Travel);
        assert_eq!((travel.weight, travel.minutes), (0.5, 2.5));

        let alight = g.find_edge(b_m2, g.physical(StopIndex(1)).unwrap()).unwrap();
        assert_eq!(alight.kind, EdgeKind::Alight);
        assert_eq!((alight.weight, alight.minutes), (0.0, 0.5));

        // One direction only
        assert!(g.find_edge(b_m2, a_m2).is_none());
    }

    #[test]
    fn every_line_stop_has_one_board_edge() {
        let feed = line_feed()
            .with_line("104", &["A", "B", "C"])
            .with_line("104", &["C", "B", "A"])
            .with_line("M1", &["B", "D"]);
        let network = build_default(&feed).unwrap();
        let g = network.graph();

        for (i, node) in g.nodes().iter().enumerate() {
            let index = NodeIndex(i as u32);
            let incoming: Vec<_> = g.edges().iter().filter(|e| e.to == index).collect();
            match node {
                Node::LineStop(stop, line) => {
                    let boards: Vec<_> = incoming.iter().filter(|e| e.kind == EdgeKind::Board).collect();
                    assert_eq!(boards.len(), 1, "{node:?}");
                    assert_eq!(boards[0].from, g.physical(*stop).unwrap());
                    for e in &incoming {
                        assert!(matches!(e.kind, EdgeKind::Board | EdgeKind::Travel), "{e:?}");
                        if e.kind == EdgeKind::Travel {
                            assert_eq!(g.node(e.from).unwrap().line(), Some(*line));
                        }
                    }
                }
                Node::Physical(_) => {
                    assert!(incoming.iter().all(|e| e.kind != EdgeKind::Board));
                }
            }
        }
    }

    #[test]
    fn travel_stays_on_one_line() {
        let feed = line_feed()
            .with_line("104", &["A", "B", "C"])
            .with_line("M1", &["A", "B", "C"]);
        let network = build_default(&feed).unwrap();
        let g = network.graph();

        let travels: Vec<_> = g.edges().iter().filter(|e| e.kind == EdgeKind::Travel).collect();
        assert_eq!(travels.len(), 4);
        for e in travels {
            let from = g.node(e.from).unwrap();
            let to = g.node(e.to).unwrap();
            assert_eq!(from.line(), e.line);
            assert_eq!(to.line(), e.line);
        }
    }

    #[test]
    fn metro_is_cheaper_per_hop() {
        let feed = line_feed()
            .with_line("104", &["A", "B"])
            .with_line("M1", &["A", "B"]);
        let network = build_default(&feed).unwrap();
        let g = network.graph();

        let bus = g.find_edge(line_stop_of(g, 0, "104"), line_stop_of(g, 1, "104")).unwrap();
        let metro = g.find_edge(line_stop_of(g, 0, "M1"), line_stop_of(g, 1, "M1")).unwrap();
        assert!(metro.weight < bus.weight);
    }

    #[test]
    fn night_lines_are_flagged() {
        let feed = line_feed()
            .with_line("N101", &["A", "B"])
            .with_line("783", &["B", "C"])
            .with_line("336", &["C", "D"]);
        let network = build_default(&feed).unwrap();
        let g = network.graph();

        let board = |stop: u32, line: &str| {
            let from = g.physical(StopIndex(stop)).unwrap();
            g.find_edge(from, line_stop_of(g, stop, line)).unwrap().clone()
        };

        let night = board(0, "N101");
        assert!(night.night_eligible && !night.day_eligible);
        let all_night = board(1, "783");
        assert!(all_night.night_eligible && all_night.day_eligible);
        let day = board(2, "336");
        assert!(!day.night_eligible && day.day_eligible);
    }

    #[test]
    fn hops_are_distinct() {
        let feed = line_feed()
            .with_line("104", &["A", "B", "C"])
            .with_line("104", &["A", "B", "C"]);
        let network = build_default(&feed).unwrap();
        let travels = network
            .graph()
            .edges()
            .iter()
            .filter(|e| e.kind == EdgeKind::Travel)
            .count();
        assert_eq!(travels, 2);
    }

    #[test]
    fn skips_self_loops_and_follows_sequence_order() {
        let feed = line_feed()
            .with_line("104", &["A"])
            .with_stop_time(StopTimeRow {
                trip_id: "T1".into(),
                stop_id: "A".into(),
                sequence: 5,
                arrival: None,
                departure: None,
            })
            .with_stop_time(StopTimeRow {
                trip_id: "T1".into(),
                stop_id: "C".into(),
                sequence: 3,
                arrival: None,
                departure: None,
            });
        // Calls in sequence order: A(1), C(3), A(5)
        let network = build_default(&feed).unwrap();
        let g = network.graph();
        let a = line_stop_of(g, 0, "104");
        let c = line_stop_of(g, 2, "104");
        assert!(g.find_edge(a, c).is_some());
        assert!(g.find_edge(c, a).is_some());
        assert!(g.find_edge(a, a).is_none());
    }

    #[test]
    fn skips_malformed_rows() {
        let feed = line_feed()
            .with_stop_row(StopRow {
                stop_id: "X".into(),
                name: "No coordinates".into(),
                lat: None,
                lon: None,
            })
            .with_stop_row(StopRow {
                stop_id: "  ".into(),
                name: "No id".into(),
                lat: Some(44.0),
                lon: Some(26.0),
            })
            .with_line("104", &["A", "X", "B", "ghost"]);
        let network = build_default(&feed).unwrap();

        assert_eq!(network.stops().len(), 4);
        assert!(network.stops().index_of_str("X").is_none());
        // X and ghost are dropped, so A and B become neighbours
        let g = network.graph();
        assert!(g.find_edge(line_stop_of(g, 0, "104"), line_stop_of(g, 1, "104")).is_some());
    }

    #[test]
    fn unreachable_feed_fails() {
        let err = build_default(&InMemoryFeed::unreachable("refused")).unwrap_err();
        assert!(matches!(err, BuildError::DataSource(DataSourceError::Unreachable { .. })));
    }

    #[test]
    fn empty_relations_fail() {
        let err = build_default(&InMemoryFeed::new()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::DataSource(DataSourceError::Empty { relation: "stops" })
        ));

        let err = build_default(&line_feed()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::DataSource(DataSourceError::Empty { relation: "stop_times" })
        ));
    }

    #[test]
    fn aborted_build_returns_no_graph() {
        let control = BuildControl::new();
        control.abort();
        let feed = line_feed().with_line("104", &["A", "B"]);
        let err = build(&feed, &BuildPolicy::default(), &control).unwrap_err();
        assert!(matches!(err, BuildError::Aborted));

        control.reset();
        assert!(build(&feed, &BuildPolicy::default(), &control).is_ok());
    }

    #[test]
    fn infers_transfers() {
        let feed = InMemoryFeed::new()
            .with_stop("A", "Alpha", 44.4000, 26.1000)
            .with_stop("B", "Bravo", 44.4010, 26.1000)
            .with_line("104", &["A", "B"]);
        let network = build_default(&feed).unwrap();
        let g = network.graph();
        let walk = g
            .find_edge(g.physical(StopIndex(0)).unwrap(), g.physical(StopIndex(1)).unwrap())
            .unwrap();
        assert_eq!(walk.kind, EdgeKind::Walk(TransferKind::Street));
    }

    #[test]
    fn builds_are_deterministic() {
        let feed = line_feed()
            .with_line("104", &["A", "B", "C", "D"])
            .with_line("M1", &["D", "B"])
            .with_line("N3", &["C", "A"]);
        let first = build_default(&feed).unwrap();
        let second = build_default(&feed).unwrap();
        assert_eq!(first, second);
    }
}
