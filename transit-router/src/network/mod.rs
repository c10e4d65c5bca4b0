//! The routing network: a layered graph plus the stops it refers to.

mod builder;
mod graph;
mod policy;

pub use builder::{BuildControl, BuildError, build};
pub use graph::{
    Edge, EdgeIndex, EdgeKind, GraphBuilder, GraphIntegrityError, LineIndex, Node, NodeIndex,
    TransferKind, TransitGraph,
};
pub use policy::{BuildPolicy, CostPolicy, LinePolicy, ModeCosts, PolicyError};

use crate::domain::Stop;
use crate::stations::StopRegistry;

/// A built network. Immutable; rebuilding produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    graph: TransitGraph,
    stops: StopRegistry,
}

impl Network {
    /// Pair a graph with its stops, checking that every node's stop exists.
    pub fn new(graph: TransitGraph, stops: StopRegistry) -> Result<Self, GraphIntegrityError> {
        for (i, node) in graph.nodes().iter().enumerate() {
            let stop = node.stop();
            if stop.get() >= stops.len() {
                return Err(GraphIntegrityError::UnknownStop { node: i, stop: stop.0 });
            }
        }
        Ok(Self { graph, stops })
    }

    pub fn graph(&self) -> &TransitGraph {
        &self.graph
    }

    pub fn stops(&self) -> &StopRegistry {
        &self.stops
    }

    /// The stop a node is located at.
    pub fn stop_of(&self, node: NodeIndex) -> Option<&Stop> {
        self.graph
            .node(node)
            .and_then(|node| self.stops.get(node.stop()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::StopIndex;

    #[test]
    fn rejects_nodes_without_stops() {
        let mut b = GraphBuilder::new();
        b.node(Node::Physical(StopIndex(3)));
        let err = Network::new(b.finish(), StopRegistry::new()).unwrap_err();
        assert_eq!(err, GraphIntegrityError::UnknownStop { node: 0, stop: 3 });
    }
}
