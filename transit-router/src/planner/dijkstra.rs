//! Cheapest-path search over the transit graph for one time mode.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::domain::TimeMode;
use crate::network::{EdgeIndex, NodeIndex, TransitGraph};

use super::cost::edge_cost;

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl Eq for State {}

// Min-heap by cost, then by node index so pops are deterministic
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cheapest path from `start` to `target` under `mode`, as a list of edges.
///
/// Returns `None` if `target` cannot be reached, and an empty path if
/// `start == target`.
pub(crate) fn shortest_path(
    graph: &TransitGraph,
    start: NodeIndex,
    target: NodeIndex,
    mode: TimeMode,
) -> Option<Vec<EdgeIndex>> {
    let n = graph.node_count();
    if start.get() >= n || target.get() >= n {
        return None;
    }

    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors: Vec<Option<EdgeIndex>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    distances[start.get()] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }
        // Stale entry
        if cost > distances[node.get()] {
            continue;
        }

        for (index, edge) in graph.outgoing(node) {
            let Some(weight) = edge_cost(edge, mode) else {
                continue;
            };
            let next_cost = cost + weight;
            let next = edge.to;
            if next_cost < distances[next.get()] {
                distances[next.get()] = next_cost;
                predecessors[next.get()] = Some(index);
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    if !distances[target.get()].is_finite() {
        return None;
    }

    let mut path = Vec::new();
    let mut current = target;
    while current != start {
        let index = predecessors[current.get()]?;
        path.push(index);
        current = graph.edge(index)?.from;
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Edge, EdgeKind, GraphBuilder, LineIndex, Node, TransferKind};
    use crate::stations::StopIndex;

    fn physical(b: &mut GraphBuilder, stop: u32) -> NodeIndex {
        b.node(Node::Physical(StopIndex(stop)))
    }

    fn walk(b: &mut GraphBuilder, from: NodeIndex, to: NodeIndex, weight: f64) {
        b.add_edge(Edge::walk(from, to, TransferKind::Street, weight, weight));
    }

    #[test]
    fn picks_cheapest_by_weight() {
        let mut b = GraphBuilder::new();
        let (a, m, z) = (physical(&mut b, 0), physical(&mut b, 1), physical(&mut b, 2));
        walk(&mut b, a, z, 10.0);
        walk(&mut b, a, m, 3.0);
        walk(&mut b, m, z, 3.0);
        let g = b.finish();

        let path = shortest_path(&g, a, z, TimeMode::Day).unwrap();
        let hops: Vec<_> = path.iter().map(|&e| g.edge(e).unwrap().to).collect();
        assert_eq!(hops, vec![m, z]);
    }

    #[test]
    fn start_equals_target() {
        let mut b = GraphBuilder::new();
        let a = physical(&mut b, 0);
        let g = b.finish();
        assert_eq!(shortest_path(&g, a, a, TimeMode::Day), Some(vec![]));
    }

    #[test]
    fn unreachable_target() {
        let mut b = GraphBuilder::new();
        let a = physical(&mut b, 0);
        let z = physical(&mut b, 1);
        walk(&mut b, z, a, 1.0);
        let g = b.finish();
        assert_eq!(shortest_path(&g, a, z, TimeMode::Day), None);
        assert_eq!(shortest_path(&g, a, NodeIndex(42), TimeMode::Day), None);
    }

    #[test]
    fn filtered_board_edges_block_the_line() {
        let mut b = GraphBuilder::new();
        let a = physical(&mut b, 0);
        let z = physical(&mut b, 1);
        let on = b.node(Node::LineStop(StopIndex(0), LineIndex(0)));
        let off = b.node(Node::LineStop(StopIndex(1), LineIndex(0)));
        let line_edge = |from, to, kind, weight| Edge {
            from,
            to,
            kind,
            weight,
            minutes: weight,
            line: Some(LineIndex(0)),
            night_eligible: true,
            day_eligible: false,
        };
        b.add_edge(line_edge(a, on, EdgeKind::Board, 1.0));
        b.add_edge(line_edge(on, off, EdgeKind::Travel, 1.0));
        b.add_edge(line_edge(off, z, EdgeKind::Alight, 0.0));
        let g = b.finish();

        assert_eq!(shortest_path(&g, a, z, TimeMode::Night).map(|p| p.len()), Some(3));
        assert_eq!(shortest_path(&g, a, z, TimeMode::Day), None);
    }
}
