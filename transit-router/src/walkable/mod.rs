//! Walking transfers between stops.
//!
//! Feeds rarely publish transfers, so they are inferred. Two passes run over
//! the stop registry:
//!
//! 1. **Name clusters.** Stops whose normalized names match belong to the
//!    same interchange (metro entrances, platforms of one square). Close
//!    pairs get a [`Rapid`](TransferKind::Rapid) transfer with a fixed cost.
//! 2. **Geographic buckets.** Stops are bucketed on a coarse coordinate
//!    grid; close pairs in the same bucket that are not yet connected get a
//!    [`Street`](TransferKind::Street) walk costed by distance.
//!
//! Every transfer is added in both directions with equal costs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::network::{Edge, GraphBuilder, Node, PolicyError, TransferKind};
use crate::stations::{NameNormalizer, StopIndex, StopRegistry};

/// Words removed from stop names before clustering.
const DEFAULT_BOILERPLATE: &[&str] = &[
    // Romanian
    "METROU", "STATIA", "PIATA", "BULEVARDUL", "SOSEAUA", "STRADA", "BD", "SOS", "STR",
    "INTRAREA", "PERON", "SCARI", "LIFT", "RULANTE", "SI", "DOAR", "URCARE", "COBORARE", "CAPAT",
    // English
    "STAIRS", "ESCALATORS", "ELEVATOR", "ONLY", "GOING", "UPWARDS", "TERMINAL",
];

/// Thresholds and costs for transfer inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferPolicy {
    /// Words stripped from names before clustering.
    pub boilerplate: Vec<String>,
    /// Normalized names shorter than this do not cluster.
    pub min_cluster_name_len: usize,
    /// Maximum distance for a rapid transfer, exclusive.
    pub rapid_max_distance_m: f64,
    pub rapid_weight: f64,
    pub rapid_minutes: f64,
    /// Maximum distance for a street walk, exclusive.
    pub street_max_distance_m: f64,
    /// Walking speed used to cost street walks.
    pub walking_speed_m_per_min: f64,
    /// Coordinates are rounded to `1 / bucket_scale` degrees for bucketing.
    pub bucket_scale: f64,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            boilerplate: DEFAULT_BOILERPLATE.iter().map(|w| w.to_string()).collect(),
            min_cluster_name_len: 4,
            rapid_max_distance_m: 600.0,
            rapid_weight: 2.0,
            rapid_minutes: 3.0,
            street_max_distance_m: 450.0,
            walking_speed_m_per_min: 80.0,
            bucket_scale: 100.0,
        }
    }
}

impl TransferPolicy {
    /// Check that distances, costs and speeds are usable.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let positive = [
            ("walking_speed_m_per_min", self.walking_speed_m_per_min),
            ("bucket_scale", self.bucket_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PolicyError::NotPositive { name, value });
            }
        }
        let non_negative = [
            ("rapid_max_distance_m", self.rapid_max_distance_m),
            ("rapid_weight", self.rapid_weight),
            ("rapid_minutes", self.rapid_minutes),
            ("street_max_distance_m", self.street_max_distance_m),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::Negative { name, value });
            }
        }
        Ok(())
    }

    /// The name normalizer for this policy's boilerplate.
    pub fn normalizer(&self) -> NameNormalizer {
        NameNormalizer::new(&self.boilerplate)
    }

    fn bucket(&self, stop: &crate::domain::Stop) -> (i64, i64) {
        (
            (stop.location.lat * self.bucket_scale).round() as i64,
            (stop.location.lon * self.bucket_scale).round() as i64,
        )
    }
}

/// Counts of transfers added, in pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub rapid: usize,
    pub street: usize,
}

/// Add inferred walking transfers to a graph under construction.
///
/// Every stop in `registry` must already have its physical node.
pub fn infer_transfers(
    graph: &mut GraphBuilder,
    registry: &StopRegistry,
    policy: &TransferPolicy,
) -> TransferStats {
    let mut stats = TransferStats::default();
    let normalizer = policy.normalizer();

    let mut clusters: BTreeMap<String, Vec<StopIndex>> = BTreeMap::new();
    for (index, stop) in registry.iter() {
        let key = normalizer.normalize(&stop.name);
        if key.len() >= policy.min_cluster_name_len {
            clusters.entry(key).or_default().push(index);
        }
    }

    for members in clusters.values().filter(|m| m.len() > 1) {
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                let Some(distance) = distance_m(registry, a, b) else {
                    continue;
                };
                if distance < policy.rapid_max_distance_m
                    && connect(
                        graph,
                        a,
                        b,
                        TransferKind::Rapid,
                        policy.rapid_weight,
                        policy.rapid_minutes,
                    )
                {
                    stats.rapid += 1;
                }
            }
        }
    }

    let mut buckets: BTreeMap<(i64, i64), Vec<StopIndex>> = BTreeMap::new();
    for (index, stop) in registry.iter() {
        buckets.entry(policy.bucket(stop)).or_default().push(index);
    }

    for members in buckets.values() {
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                let Some(distance) = distance_m(registry, a, b) else {
                    continue;
                };
                if distance < policy.street_max_distance_m {
                    let minutes = distance / policy.walking_speed_m_per_min;
                    if connect(graph, a, b, TransferKind::Street, minutes, minutes) {
                        stats.street += 1;
                    }
                }
            }
        }
    }

    debug!(
        rapid = stats.rapid,
        street = stats.street,
        clusters = clusters.len(),
        buckets = buckets.len(),
        "inferred walking transfers"
    );
    stats
}

fn distance_m(registry: &StopRegistry, a: StopIndex, b: StopIndex) -> Option<f64> {
    let (a, b) = (registry.get(a)?, registry.get(b)?);
    Some(a.location.distance_m(&b.location))
}

fn connect(
    graph: &mut GraphBuilder,
    a: StopIndex,
    b: StopIndex,
    kind: TransferKind,
    weight: f64,
    minutes: f64,
) -> bool {
    let from = graph.node(Node::Physical(a));
    let to = graph.node(Node::Physical(b));
    graph.add_symmetric(Edge::walk(from, to, kind, weight, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, Stop, StopId};
    use crate::network::{EdgeKind, TransitGraph};

    fn registry(stops: &[(&str, &str, f64, f64)]) -> StopRegistry {
        StopRegistry::from_stops(stops.iter().map(|(id, name, lat, lon)| {
            Stop::new(
                StopId::parse(id).unwrap(),
                *name,
                Coordinates::new(*lat, *lon).unwrap(),
            )
        }))
    }

    fn infer(registry: &StopRegistry) -> (TransitGraph, TransferStats) {
        let mut graph = GraphBuilder::new();
        for (index, _) in registry.iter() {
            graph.node(Node::Physical(index));
        }
        let stats = infer_transfers(&mut graph, registry, &TransferPolicy::default());
        (graph.finish(), stats)
    }

    fn walk(g: &TransitGraph, a: u32, b: u32) -> Option<&Edge> {
        let from = g.physical(StopIndex(a))?;
        let to = g.physical(StopIndex(b))?;
        g.find_edge(from, to)
    }

    #[test]
    fn name_cluster_creates_rapid_transfer() {
        // About 330 m apart, in different coordinate buckets
        let reg = registry(&[
            ("1", "Metrou Piata Unirii", 44.4270, 26.1020),
            ("2", "Piata Unirii - Peron B", 44.4240, 26.1020),
        ]);
        let (g, stats) = infer(&reg);
        assert_eq!(stats, TransferStats { rapid: 1, street: 0 });

        let edge = walk(&g, 0, 1).unwrap();
        assert_eq!(edge.kind, EdgeKind::Walk(TransferKind::Rapid));
        assert_eq!(edge.weight, 2.0);
        assert_eq!(edge.minutes, 3.0);
    }

    #[test]
    fn far_cluster_members_are_not_connected() {
        let reg = registry(&[
            ("1", "Unirii", 44.4270, 26.1020),
            ("2", "Unirii", 44.4370, 26.1020),
        ]);
        let (g, stats) = infer(&reg);
        assert_eq!(stats, TransferStats::default());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn short_names_do_not_cluster() {
        // "Bd X" normalizes to the empty string
        let reg = registry(&[
            ("1", "Bd X", 44.4270, 26.1020),
            ("2", "Bd X", 44.4245, 26.1020),
        ]);
        let (_, stats) = infer(&reg);
        assert_eq!(stats.rapid, 0);
    }

    #[test]
    fn street_walk_costed_by_distance() {
        // Same bucket (44.40, 26.10), about 111 m apart
        let reg = registry(&[
            ("1", "Alpha", 44.4000, 26.1000),
            ("2", "Omega", 44.4010, 26.1000),
        ]);
        let (g, stats) = infer(&reg);
        assert_eq!(stats, TransferStats { rapid: 0, street: 1 });

        let edge = walk(&g, 0, 1).unwrap();
        assert_eq!(edge.kind, EdgeKind::Walk(TransferKind::Street));
        assert_eq!(edge.weight, edge.minutes);
        assert!((edge.minutes - 111.2 / 80.0).abs() < 0.01, "{}", edge.minutes);
    }

    #[test]
    fn street_pass_skips_connected_pairs() {
        let reg = registry(&[
            ("1", "Universitate", 44.4000, 26.1000),
            ("2", "Universitate", 44.4010, 26.1000),
        ]);
        let (g, stats) = infer(&reg);
        assert_eq!(stats, TransferStats { rapid: 1, street: 0 });
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn different_buckets_do_not_walk() {
        // About 111 m apart but across a bucket boundary
        let reg = registry(&[
            ("1", "Alpha", 44.4049, 26.1000),
            ("2", "Omega", 44.4059, 26.1000),
        ]);
        let (_, stats) = infer(&reg);
        assert_eq!(stats.street, 0);
    }

    #[test]
    fn transfers_are_symmetric() {
        let reg = registry(&[
            ("1", "Eroilor", 44.4000, 26.1000),
            ("2", "Eroilor A", 44.4020, 26.1000),
            ("3", "Cotroceni", 44.4010, 26.1010),
            ("4", "Opera", 44.4015, 26.1030),
        ]);
        let (g, _) = infer(&reg);
        assert!(g.edge_count() > 0);
        for edge in g.edges() {
            let back = g.find_edge(edge.to, edge.from).expect("reverse edge");
            assert_eq!(back.kind, edge.kind);
            assert_eq!(back.weight, edge.weight);
            assert_eq!(back.minutes, edge.minutes);
        }
    }

    #[test]
    fn policy_validation() {
        assert!(TransferPolicy::default().validate().is_ok());
        let bad = TransferPolicy {
            walking_speed_m_per_min: 0.0,
            ..TransferPolicy::default()
        };
        assert_eq!(
            bad.validate(),
            Err(PolicyError::NotPositive {
                name: "walking_speed_m_per_min",
                value: 0.0
            })
        );
    }
}
