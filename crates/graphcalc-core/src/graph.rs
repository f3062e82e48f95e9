//! # Graph Model
//!
//! The read-only simple graph consumed by every formulation.
//!
//! This module implements the `GraphView` trait for the owned `Graph` and for
//! borrowed induced-subgraph views. All data structures use `BTreeMap` /
//! `BTreeSet` so every traversal happens in label order.

use crate::{Edge, GraphCalcError, Vertex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// GRAPHVIEW TRAIT
// =============================================================================

/// The read contract every graph source must satisfy.
///
/// Generators, the petgraph adapter and induced-subgraph views all hand the
/// engine something implementing this trait; invariant code never asks where
/// the graph came from.
pub trait GraphView {
    /// All vertices in ascending label order.
    fn vertices(&self) -> Vec<Vertex>;

    /// Whether `v` is a vertex of this graph.
    fn contains_vertex(&self, v: Vertex) -> bool;

    /// Neighbors of `v` in ascending label order.
    ///
    /// Fails with `VertexNotFound` if `v` is not a vertex.
    fn neighbors(&self, v: Vertex) -> Result<Vec<Vertex>, GraphCalcError>;

    /// Number of vertices.
    fn order(&self) -> usize {
        self.vertices().len()
    }

    /// Number of edges.
    fn size(&self) -> usize {
        self.edges().len()
    }

    /// Degree of `v`.
    fn degree(&self, v: Vertex) -> Result<usize, GraphCalcError> {
        Ok(self.neighbors(v)?.len())
    }

    /// Degrees of all vertices, largest first.
    fn degree_sequence(&self) -> Vec<usize> {
        let mut degrees: Vec<usize> = self
            .vertices()
            .into_iter()
            .map(|v| self.degree(v).unwrap_or(0))
            .collect();
        degrees.sort_unstable_by(|a, b| b.cmp(a));
        degrees
    }

    /// All edges in deterministic order.
    fn edges(&self) -> Vec<Edge> {
        let mut edges = BTreeSet::new();
        for v in self.vertices() {
            for u in self.neighbors(v).unwrap_or_default() {
                edges.insert(Edge::new(u, v));
            }
        }
        edges.into_iter().collect()
    }

    /// Breadth-first connectivity test in O(V + E).
    ///
    /// The graph without vertices counts as connected.
    fn is_connected(&self) -> bool {
        let vertices = self.vertices();
        let Some(&start) = vertices.first() else {
            return true;
        };

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current).unwrap_or_default() {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        visited.len() == vertices.len()
    }
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// An undirected simple graph.
///
/// Adjacency is kept symmetric: `u ∈ N(v)` iff `v ∈ N(u)`. Self-loops are
/// rejected and repeated edges collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    /// Adjacency: vertex -> neighbor set
    adjacency: BTreeMap<Vertex, BTreeSet<Vertex>>,

    /// Optional display name supplied by a generator or the caller.
    name: Option<String>,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an edgeless graph on vertices `0..n`.
    #[must_use]
    pub fn with_order(n: u64) -> Self {
        let mut graph = Self::new();
        for v in 0..n {
            graph.add_vertex(Vertex(v));
        }
        graph
    }

    /// Build a graph from raw label pairs. Endpoints become vertices.
    pub fn from_edges<I>(edges: I) -> Result<Self, GraphCalcError>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_edge(Vertex(a), Vertex(b))?;
        }
        Ok(graph)
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Insert a vertex. Returns `false` if it was already present.
    pub fn add_vertex(&mut self, v: Vertex) -> bool {
        if self.adjacency.contains_key(&v) {
            return false;
        }
        self.adjacency.insert(v, BTreeSet::new());
        true
    }

    /// Insert an edge, creating missing endpoints.
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, a: Vertex, b: Vertex) -> Result<bool, GraphCalcError> {
        if a == b {
            return Err(GraphCalcError::SelfLoop(a));
        }
        let inserted = self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(inserted)
    }

    /// A copy of this graph with one more edge.
    pub fn with_edge(&self, a: Vertex, b: Vertex) -> Result<Self, GraphCalcError> {
        let mut graph = self.clone();
        graph.add_edge(a, b)?;
        Ok(graph)
    }

    /// Whether `a` and `b` are adjacent.
    #[must_use]
    pub fn has_edge(&self, a: Vertex, b: Vertex) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }

    /// Borrow the neighbor set of `v`.
    pub fn neighbor_set(&self, v: Vertex) -> Result<&BTreeSet<Vertex>, GraphCalcError> {
        self.adjacency
            .get(&v)
            .ok_or(GraphCalcError::VertexNotFound(v))
    }

    /// Iterate vertices without allocating.
    pub fn vertex_iter(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.adjacency.keys().copied()
    }

    /// N(v).
    pub fn open_neighborhood(&self, v: Vertex) -> Result<BTreeSet<Vertex>, GraphCalcError> {
        self.neighbor_set(v).cloned()
    }

    /// N[v] = N(v) ∪ {v}.
    pub fn closed_neighborhood(&self, v: Vertex) -> Result<BTreeSet<Vertex>, GraphCalcError> {
        let mut closed = self.neighbor_set(v)?.clone();
        closed.insert(v);
        Ok(closed)
    }

    /// N[S], the union of closed neighborhoods of the vertices in `set`.
    pub fn closed_neighborhood_of_set<'a, I>(
        &self,
        set: I,
    ) -> Result<BTreeSet<Vertex>, GraphCalcError>
    where
        I: IntoIterator<Item = &'a Vertex>,
    {
        let mut closed = BTreeSet::new();
        for v in set {
            closed.extend(self.closed_neighborhood(*v)?);
        }
        Ok(closed)
    }

    /// Smallest degree, 0 for the empty graph.
    #[must_use]
    pub fn minimum_degree(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).min().unwrap_or(0)
    }

    /// Largest degree, 0 for the empty graph.
    #[must_use]
    pub fn maximum_degree(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// The complement on the same vertex set.
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut complement = Self {
            adjacency: BTreeMap::new(),
            name: self.name.as_ref().map(|n| format!("complement of {}", n)),
        };
        for v in self.vertex_iter() {
            complement.add_vertex(v);
        }
        for (i, u) in self.vertex_iter().enumerate() {
            for v in self.vertex_iter().skip(i + 1) {
                if !self.has_edge(u, v) {
                    complement.adjacency.entry(u).or_default().insert(v);
                    complement.adjacency.entry(v).or_default().insert(u);
                }
            }
        }
        complement
    }

    /// The line graph together with the edge each of its vertices stands for.
    ///
    /// Line-graph vertex `i` represents `edges[i]`; two are adjacent iff the
    /// edges share an endpoint.
    #[must_use]
    pub fn line_graph(&self) -> (Self, Vec<Edge>) {
        let edges = GraphView::edges(self);
        let mut line = Self::with_order(edges.len() as u64);
        for (i, a) in edges.iter().enumerate() {
            for (j, b) in edges.iter().enumerate().skip(i + 1) {
                if a.shares_endpoint(b) {
                    line.adjacency.entry(Vertex(i as u64)).or_default().insert(Vertex(j as u64));
                    line.adjacency.entry(Vertex(j as u64)).or_default().insert(Vertex(i as u64));
                }
            }
        }
        (line, edges)
    }

    /// A read view of the subgraph induced by `vertices`.
    ///
    /// Labels that are not vertices of this graph are ignored.
    pub fn induced_subgraph<I>(&self, vertices: I) -> InducedSubgraph<'_>
    where
        I: IntoIterator<Item = Vertex>,
    {
        InducedSubgraph {
            parent: self,
            members: vertices
                .into_iter()
                .filter(|v| self.adjacency.contains_key(v))
                .collect(),
        }
    }
}

impl GraphView for Graph {
    fn vertices(&self) -> Vec<Vertex> {
        self.vertex_iter().collect()
    }

    fn contains_vertex(&self, v: Vertex) -> bool {
        self.adjacency.contains_key(&v)
    }

    fn neighbors(&self, v: Vertex) -> Result<Vec<Vertex>, GraphCalcError> {
        Ok(self.neighbor_set(v)?.iter().copied().collect())
    }

    fn order(&self) -> usize {
        self.adjacency.len()
    }

    fn size(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    fn degree(&self, v: Vertex) -> Result<usize, GraphCalcError> {
        Ok(self.neighbor_set(v)?.len())
    }

    fn edges(&self) -> Vec<Edge> {
        self.adjacency
            .iter()
            .flat_map(|(u, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |v| *u < **v)
                    .map(move |v| Edge::new(*u, *v))
            })
            .collect()
    }
}

// =============================================================================
// INDUCED SUBGRAPH VIEW
// =============================================================================

/// A borrowed view of `G[S]`.
///
/// Nothing is copied; neighbor queries filter the parent's adjacency.
#[derive(Debug, Clone)]
pub struct InducedSubgraph<'a> {
    parent: &'a Graph,
    members: BTreeSet<Vertex>,
}

impl GraphView for InducedSubgraph<'_> {
    fn vertices(&self) -> Vec<Vertex> {
        self.members.iter().copied().collect()
    }

    fn contains_vertex(&self, v: Vertex) -> bool {
        self.members.contains(&v)
    }

    fn neighbors(&self, v: Vertex) -> Result<Vec<Vertex>, GraphCalcError> {
        if !self.members.contains(&v) {
            return Err(GraphCalcError::VertexNotFound(v));
        }
        Ok(self
            .parent
            .neighbor_set(v)?
            .iter()
            .filter(|u| self.members.contains(u))
            .copied()
            .collect())
    }

    fn order(&self) -> usize {
        self.members.len()
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Serializable representation of a graph, used for file input and output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
    #[serde(default)]
    pub name: Option<String>,
    /// Vertices, including isolated ones. Edge endpoints are added implicitly.
    #[serde(default)]
    pub vertices: Vec<u64>,
    pub edges: Vec<(u64, u64)>,
}

impl From<&Graph> for SerializableGraph {
    fn from(graph: &Graph) -> Self {
        Self {
            name: graph.name.clone(),
            vertices: graph.vertex_iter().map(|v| v.0).collect(),
            edges: GraphView::edges(graph)
                .into_iter()
                .map(|e| (e.first().0, e.second().0))
                .collect(),
        }
    }
}

impl TryFrom<SerializableGraph> for Graph {
    type Error = GraphCalcError;

    fn try_from(sg: SerializableGraph) -> Result<Self, Self::Error> {
        let mut graph = Graph::new();
        graph.name = sg.name;
        for v in sg.vertices {
            graph.add_vertex(Vertex(v));
        }
        for (a, b) in sg.edges {
            graph.add_edge(Vertex(a), Vertex(b))?;
        }
        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: u64) -> Graph {
        Graph::from_edges((1..n).map(|i| (i - 1, i))).expect("path")
    }

    #[test]
    fn adjacency_is_symmetric() {
        let graph = Graph::from_edges([(0, 1), (1, 2)]).expect("graph");
        assert!(graph.has_edge(Vertex(0), Vertex(1)));
        assert!(graph.has_edge(Vertex(1), Vertex(0)));
        assert!(!graph.has_edge(Vertex(0), Vertex(2)));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = Graph::new();
        assert!(graph.add_edge(Vertex(0), Vertex(1)).expect("edge"));
        assert!(!graph.add_edge(Vertex(1), Vertex(0)).expect("edge"));
        assert_eq!(graph.size(), 1);
    }

    #[test]
    fn self_loop_rejected() {
        let mut graph = Graph::new();
        let result = graph.add_edge(Vertex(4), Vertex(4));
        assert!(matches!(result, Err(GraphCalcError::SelfLoop(Vertex(4)))));
    }

    #[test]
    fn neighbors_of_missing_vertex_fails() {
        let graph = path(3);
        let result = graph.neighbors(Vertex(99));
        assert!(matches!(result, Err(GraphCalcError::VertexNotFound(Vertex(99)))));
        assert!(graph.degree(Vertex(99)).is_err());
    }

    #[test]
    fn degree_sequence_is_descending() {
        let star = Graph::from_edges([(0, 1), (0, 2), (0, 3), (3, 4)]).expect("graph");
        assert_eq!(star.degree_sequence(), vec![3, 2, 1, 1, 1]);
        assert_eq!(star.maximum_degree(), 3);
        assert_eq!(star.minimum_degree(), 1);
    }

    #[test]
    fn connectivity() {
        assert!(path(5).is_connected());
        assert!(Graph::new().is_connected());

        let mut split = path(3);
        split.add_vertex(Vertex(10));
        assert!(!split.is_connected());
    }

    #[test]
    fn induced_subgraph_filters_neighbors() {
        let graph = path(5);
        let view = graph.induced_subgraph([Vertex(0), Vertex(1), Vertex(3)]);
        assert_eq!(view.order(), 3);
        assert_eq!(view.neighbors(Vertex(1)).expect("n"), vec![Vertex(0)]);
        assert!(!view.is_connected());
        assert!(view.neighbors(Vertex(2)).is_err());

        let connected = graph.induced_subgraph([Vertex(1), Vertex(2), Vertex(3)]);
        assert!(connected.is_connected());
        assert_eq!(connected.size(), 2);
    }

    #[test]
    fn complement_of_path() {
        let complement = path(4).complement();
        assert_eq!(complement.order(), 4);
        assert_eq!(complement.size(), 3);
        assert!(complement.has_edge(Vertex(0), Vertex(2)));
        assert!(!complement.has_edge(Vertex(0), Vertex(1)));
    }

    #[test]
    fn line_graph_of_path_is_path() {
        let (line, edges) = path(4).line_graph();
        assert_eq!(edges.len(), 3);
        assert_eq!(line.order(), 3);
        assert_eq!(line.size(), 2);
        assert!(line.has_edge(Vertex(0), Vertex(1)));
    }

    #[test]
    fn closed_neighborhood_of_set() {
        let graph = path(5);
        let closed = graph
            .closed_neighborhood_of_set(&[Vertex(0), Vertex(4)])
            .expect("closed");
        let expected: BTreeSet<_> = [0, 1, 3, 4].into_iter().map(Vertex).collect();
        assert_eq!(closed, expected);
    }

    #[test]
    fn serializable_graph_roundtrip() {
        let mut graph = path(3).with_name("P3");
        graph.add_vertex(Vertex(7));

        let serializable = SerializableGraph::from(&graph);
        assert_eq!(serializable.vertices, vec![0, 1, 2, 7]);

        let restored = Graph::try_from(serializable).expect("restore");
        assert_eq!(restored, graph);
        assert_eq!(restored.name(), Some("P3"));
    }
}
