//! Layered routing graph.
//!
//! Nodes live in an arena and are addressed by [`NodeIndex`]. Every stop has
//! one `Physical` node; every (stop, line) pair served by a line has one
//! `LineStop` node meaning "aboard this line at this stop". Edges are stored
//! in insertion order with per-node outgoing adjacency lists.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Line;
use crate::stations::StopIndex;

/// Index of a node in a [`TransitGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(pub u32);

/// Index of an edge in a [`TransitGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeIndex(pub u32);

/// Index of a line in a [`TransitGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineIndex(pub u32);

impl NodeIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl EdgeIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl LineIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// A graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    /// Standing at a stop.
    Physical(StopIndex),
    /// Aboard a line while at a stop.
    LineStop(StopIndex, LineIndex),
}

impl Node {
    /// The stop this node is located at.
    pub fn stop(&self) -> StopIndex {
        match self {
            Node::Physical(stop) | Node::LineStop(stop, _) => *stop,
        }
    }

    /// The line, for line-stop nodes.
    pub fn line(&self) -> Option<LineIndex> {
        match self {
            Node::Physical(_) => None,
            Node::LineStop(_, line) => Some(*line),
        }
    }
}

/// How a walking edge was inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Interchange inside one complex (same normalized name).
    Rapid,
    /// Open-air walk between nearby stops.
    Street,
}

/// What traversing an edge means for the traveller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Riding a line from one stop to the next.
    Travel,
    /// Getting on a line, including the wait for it.
    Board,
    /// Getting off a line.
    Alight,
    /// Walking between two stops.
    Walk(TransferKind),
}

/// A directed edge with its two costs.
///
/// `weight` steers the search; `minutes` is the real elapsed time reported
/// to the traveller. They are deliberately independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub kind: EdgeKind,
    pub weight: f64,
    pub minutes: f64,
    pub line: Option<LineIndex>,
    pub night_eligible: bool,
    pub day_eligible: bool,
}

impl Edge {
    /// A walking edge. Walks are available at any hour.
    pub fn walk(from: NodeIndex, to: NodeIndex, kind: TransferKind, weight: f64, minutes: f64) -> Self {
        Self {
            from,
            to,
            kind: EdgeKind::Walk(kind),
            weight,
            minutes,
            line: None,
            night_eligible: true,
            day_eligible: true,
        }
    }
}

/// Structural problems found when assembling a graph from parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphIntegrityError {
    #[error("edge {edge} references missing node {node}")]
    DanglingNode { edge: usize, node: u32 },

    #[error("{what} references missing line {line}")]
    UnknownLine { what: String, line: u32 },

    #[error("node {node} references missing stop {stop}")]
    UnknownStop { node: usize, stop: u32 },

    #[error("node {node} is a duplicate")]
    DuplicateNode { node: usize },

    #[error("edge {edge} duplicates an earlier edge between the same nodes")]
    DuplicateEdge { edge: usize },
}

/// Immutable layered routing graph.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    nodes: Vec<Node>,
    lines: Vec<Line>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeIndex>>,
    lookup: HashMap<Node, NodeIndex>,
}

impl PartialEq for TransitGraph {
    fn eq(&self, other: &Self) -> bool {
        // Adjacency and lookup are derived from these three
        self.nodes == other.nodes && self.lines == other.lines && self.edges == other.edges
    }
}

impl TransitGraph {
    /// Assemble a graph from its parts, checking every reference.
    ///
    /// Adjacency lists are rebuilt in edge order, so a graph taken apart
    /// with [`nodes`](Self::nodes), [`lines`](Self::lines) and
    /// [`edges`](Self::edges) reassembles identically.
    pub fn from_parts(
        nodes: Vec<Node>,
        lines: Vec<Line>,
        edges: Vec<Edge>,
    ) -> Result<Self, GraphIntegrityError> {
        let mut lookup = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if let Some(line) = node.line()
                && line.get() >= lines.len()
            {
                return Err(GraphIntegrityError::UnknownLine {
                    what: format!("node {i}"),
                    line: line.0,
                });
            }
            if lookup.insert(*node, NodeIndex(i as u32)).is_some() {
                return Err(GraphIntegrityError::DuplicateNode { node: i });
            }
        }

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut pairs = HashSet::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            for node in [edge.from, edge.to] {
                if node.get() >= nodes.len() {
                    return Err(GraphIntegrityError::DanglingNode { edge: i, node: node.0 });
                }
            }
            if let Some(line) = edge.line
                && line.get() >= lines.len()
            {
                return Err(GraphIntegrityError::UnknownLine {
                    what: format!("edge {i}"),
                    line: line.0,
                });
            }
            if !pairs.insert((edge.from, edge.to)) {
                return Err(GraphIntegrityError::DuplicateEdge { edge: i });
            }
            outgoing[edge.from.get()].push(EdgeIndex(i as u32));
        }

        Ok(Self {
            nodes,
            lines,
            edges,
            outgoing,
            lookup,
        })
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All lines in index order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.get())
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index.get())
    }

    pub fn line(&self, index: LineIndex) -> Option<&Line> {
        self.lines.get(index.get())
    }

    /// Name of the line an edge belongs to, if any.
    pub fn line_name(&self, edge: &Edge) -> Option<&str> {
        edge.line
            .and_then(|line| self.line(line))
            .map(|line| line.name.as_str())
    }

    /// Index of a node, if present.
    pub fn node_index(&self, node: &Node) -> Option<NodeIndex> {
        self.lookup.get(node).copied()
    }

    /// Index of a stop's physical node.
    pub fn physical(&self, stop: StopIndex) -> Option<NodeIndex> {
        self.node_index(&Node::Physical(stop))
    }

    /// Edges leaving `node`, in insertion order.
    pub fn outgoing(&self, node: NodeIndex) -> impl Iterator<Item = (EdgeIndex, &Edge)> + '_ {
        self.outgoing
            .get(node.get())
            .into_iter()
            .flatten()
            .map(|&index| (index, &self.edges[index.get()]))
    }

    /// The edge from `from` to `to`, if any.
    pub fn find_edge(&self, from: NodeIndex, to: NodeIndex) -> Option<&Edge> {
        self.outgoing(from)
            .find(|(_, edge)| edge.to == to)
            .map(|(_, edge)| edge)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl fmt::Display for TransitGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} edges, {} lines",
            self.nodes.len(),
            self.edges.len(),
            self.lines.len()
        )
    }
}

/// Mutable graph under construction.
///
/// Only the builder and transfer inference touch it; [`finish`](Self::finish)
/// freezes it into a [`TransitGraph`]. At most one edge is kept per ordered
/// node pair.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: TransitGraph,
    line_lookup: HashMap<String, LineIndex>,
    pairs: HashSet<(NodeIndex, NodeIndex)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or insert a node.
    pub fn node(&mut self, node: Node) -> NodeIndex {
        if let Some(&index) = self.graph.lookup.get(&node) {
            return index;
        }
        let index = NodeIndex(self.graph.nodes.len() as u32);
        self.graph.nodes.push(node);
        self.graph.outgoing.push(Vec::new());
        self.graph.lookup.insert(node, index);
        index
    }

    /// Get or insert a line, keyed by name.
    pub fn line(&mut self, line: Line) -> LineIndex {
        if let Some(&index) = self.line_lookup.get(&line.name) {
            return index;
        }
        let index = LineIndex(self.graph.lines.len() as u32);
        self.line_lookup.insert(line.name.clone(), index);
        self.graph.lines.push(line);
        index
    }

    /// Index of a node, if created.
    pub fn node_index(&self, node: &Node) -> Option<NodeIndex> {
        self.graph.node_index(node)
    }

    /// Index of a stop's physical node, if created.
    pub fn physical(&self, stop: StopIndex) -> Option<NodeIndex> {
        self.graph.physical(stop)
    }

    /// Whether an edge from `from` to `to` exists.
    pub fn contains_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.pairs.contains(&(from, to))
    }

    /// Add an edge unless one already connects the same ordered pair.
    ///
    /// Returns whether the edge was added.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.pairs.insert((edge.from, edge.to)) {
            return false;
        }
        let index = EdgeIndex(self.graph.edges.len() as u32);
        self.graph.outgoing[edge.from.get()].push(index);
        self.graph.edges.push(edge);
        true
    }

    /// Add a pair of opposite edges with equal costs, if neither exists.
    ///
    /// Returns whether the pair was added.
    pub fn add_symmetric(&mut self, edge: Edge) -> bool {
        if self.contains_edge(edge.from, edge.to) || self.contains_edge(edge.to, edge.from) {
            return false;
        }
        let reverse = Edge {
            from: edge.to,
            to: edge.from,
            ..edge.clone()
        };
        self.add_edge(edge);
        self.add_edge(reverse);
        true
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edges.len()
    }

    /// Freeze the graph.
    pub fn finish(self) -> TransitGraph {
        self.graph
    }
}
