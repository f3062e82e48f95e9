//! # petgraph Adapter
//!
//! Normalizes petgraph graphs into `Graph` at the boundary and exposes the
//! small petgraph property namespace used as the knowledge-table fallback.
//!
//! Node indices become vertex labels, self-loops are dropped and parallel
//! edges collapse, so formulations never see a multigraph.

use crate::graph::{Graph, GraphView};
use crate::{PropertyValue, Vertex};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::graphmap::UnGraphMap;
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;
use tracing::trace;

/// Property names answered by petgraph when the registry does not know them.
pub const PETGRAPH_PROPERTIES: [&str; 4] = [
    "connected_components",
    "is_cyclic_undirected",
    "node_count",
    "edge_count",
];

/// Build a simple graph, dropping the edges `add_edge` refuses (self-loops).
fn simple_graph<V, E>(vertices: V, edges: E) -> Graph
where
    V: IntoIterator<Item = u64>,
    E: IntoIterator<Item = (u64, u64)>,
{
    let mut graph = Graph::new();
    for v in vertices {
        graph.add_vertex(Vertex(v));
    }
    for (a, b) in edges {
        if let Err(error) = graph.add_edge(Vertex(a), Vertex(b)) {
            trace!(%error, "edge dropped at petgraph boundary");
        }
    }
    graph
}

impl<N, E> From<&UnGraph<N, E>> for Graph {
    fn from(source: &UnGraph<N, E>) -> Self {
        simple_graph(
            source.node_indices().map(|node| node.index() as u64),
            source
                .edge_references()
                .map(|edge| (edge.source().index() as u64, edge.target().index() as u64)),
        )
    }
}

impl<E> From<&UnGraphMap<u64, E>> for Graph {
    fn from(source: &UnGraphMap<u64, E>) -> Self {
        simple_graph(source.nodes(), source.all_edges().map(|(a, b, _)| (a, b)))
    }
}

impl Graph {
    /// Convert into a petgraph `UnGraph` weighted by vertex labels.
    ///
    /// Nodes are added in label order, so node index `i` holds the `i`-th
    /// smallest label.
    #[must_use]
    pub fn to_petgraph(&self) -> UnGraph<Vertex, ()> {
        let mut target = UnGraph::new_undirected();
        let mut index: BTreeMap<Vertex, NodeIndex> = BTreeMap::new();
        for v in self.vertex_iter() {
            index.insert(v, target.add_node(v));
        }
        for edge in GraphView::edges(self) {
            if let (Some(&a), Some(&b)) = (index.get(&edge.first()), index.get(&edge.second())) {
                target.add_edge(a, b, ());
            }
        }
        target
    }
}

/// Evaluate a property from the petgraph namespace.
///
/// Returns `None` when `name` is not one of `PETGRAPH_PROPERTIES`.
pub fn external_property(graph: &Graph, name: &str) -> Option<PropertyValue> {
    let pg = graph.to_petgraph();
    let value = match name {
        "connected_components" => {
            PropertyValue::Int(petgraph::algo::connected_components(&pg) as i64)
        }
        "is_cyclic_undirected" => PropertyValue::Bool(petgraph::algo::is_cyclic_undirected(&pg)),
        "node_count" => PropertyValue::Int(pg.node_count() as i64),
        "edge_count" => PropertyValue::Int(pg.edge_count() as i64),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ungraph_normalized_at_boundary() {
        let mut source: UnGraph<&str, u32> = UnGraph::new_undirected();
        let a = source.add_node("a");
        let b = source.add_node("b");
        let c = source.add_node("c");
        source.add_edge(a, b, 1);
        source.add_edge(b, a, 2);
        source.add_edge(c, c, 3);

        let graph = Graph::from(&source);
        assert_eq!(graph.order(), 3);
        assert_eq!(graph.size(), 1);
        assert!(graph.has_edge(Vertex(0), Vertex(1)));
    }

    #[test]
    fn graphmap_keeps_labels() {
        let source: UnGraphMap<u64, ()> = UnGraphMap::from_edges([(10, 20), (20, 30)]);
        let graph = Graph::from(&source);
        assert_eq!(graph.vertices(), vec![Vertex(10), Vertex(20), Vertex(30)]);
        assert!(graph.has_edge(Vertex(30), Vertex(20)));
    }

    #[test]
    fn graphmap_self_loops_are_dropped() {
        let source: UnGraphMap<u64, ()> = UnGraphMap::from_edges([(1, 1), (1, 2), (2, 2)]);
        let graph = Graph::from(&source);
        assert_eq!(graph.vertices(), vec![Vertex(1), Vertex(2)]);
        assert_eq!(graph.size(), 1);
        assert!(!graph.has_edge(Vertex(1), Vertex(1)));
    }

    #[test]
    fn petgraph_roundtrip_preserves_shape() {
        let graph = Graph::from_edges([(0, 1), (1, 2), (2, 0), (3, 4)]).expect("graph");
        let pg = graph.to_petgraph();
        assert_eq!(pg.node_count(), 5);
        assert_eq!(pg.edge_count(), 4);

        let back = Graph::from(&pg);
        assert_eq!(back.size(), 4);
    }

    #[test]
    fn external_namespace() {
        let graph = Graph::from_edges([(0, 1), (1, 2), (2, 0), (3, 4)]).expect("graph");
        assert_eq!(
            external_property(&graph, "connected_components"),
            Some(PropertyValue::Int(2))
        );
        assert_eq!(
            external_property(&graph, "is_cyclic_undirected"),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(external_property(&graph, "edge_count"), Some(PropertyValue::Int(4)));
        assert_eq!(external_property(&graph, "no_such_thing"), None);
    }
}
