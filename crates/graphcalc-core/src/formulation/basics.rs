//! # Structural Invariants
//!
//! Order, size, distances and the boolean predicates used as table columns.
//! Distance invariants are `None` when undefined (empty or disconnected
//! graph) and become the missing marker in a knowledge table.

use crate::graph::{Graph, GraphView};
use crate::{GraphCalcError, Ratio, Vertex};
use std::collections::{BTreeMap, VecDeque};

// =============================================================================
// COUNTS & DISTANCES
// =============================================================================

pub fn order(graph: &Graph) -> usize {
    graph.order()
}

pub fn size(graph: &Graph) -> usize {
    graph.size()
}

/// BFS distances from `source` to every reachable vertex.
fn distances_from(graph: &Graph, source: Vertex) -> Result<BTreeMap<Vertex, usize>, GraphCalcError> {
    let mut distance = BTreeMap::from([(source, 0)]);
    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        let next = distance[&v] + 1;
        for &u in graph.neighbor_set(v)? {
            distance.entry(u).or_insert_with(|| {
                queue.push_back(u);
                next
            });
        }
    }
    Ok(distance)
}

/// Eccentricity of every vertex, or `None` if the graph is empty or
/// disconnected.
fn eccentricities(graph: &Graph) -> Result<Option<Vec<usize>>, GraphCalcError> {
    if graph.order() == 0 || !graph.is_connected() {
        return Ok(None);
    }
    let mut result = Vec::with_capacity(graph.order());
    for v in graph.vertex_iter() {
        let distance = distances_from(graph, v)?;
        result.push(distance.values().copied().max().unwrap_or(0));
    }
    Ok(Some(result))
}

/// Largest eccentricity.
pub fn diameter(graph: &Graph) -> Result<Option<usize>, GraphCalcError> {
    Ok(eccentricities(graph)?.and_then(|e| e.into_iter().max()))
}

/// Smallest eccentricity.
pub fn radius(graph: &Graph) -> Result<Option<usize>, GraphCalcError> {
    Ok(eccentricities(graph)?.and_then(|e| e.into_iter().min()))
}

/// Mean distance over ordered pairs of distinct vertices.
///
/// `None` for disconnected graphs and graphs with fewer than two vertices.
pub fn average_shortest_path_length(graph: &Graph) -> Result<Option<Ratio>, GraphCalcError> {
    let n = graph.order();
    if n < 2 || !graph.is_connected() {
        return Ok(None);
    }
    let mut total = 0usize;
    for v in graph.vertex_iter() {
        total += distances_from(graph, v)?.values().sum::<usize>();
    }
    Ratio::new(total as i64, (n * (n - 1)) as i64).map(Some)
}

// =============================================================================
// PREDICATES
// =============================================================================

pub fn connected(graph: &Graph) -> bool {
    graph.is_connected()
}

/// Two-colorable, checked by BFS on every component.
pub fn bipartite(graph: &Graph) -> bool {
    let mut side: BTreeMap<Vertex, bool> = BTreeMap::new();
    for start in graph.vertex_iter() {
        if side.contains_key(&start) {
            continue;
        }
        side.insert(start, false);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            let here = side[&v];
            for &u in graph.neighbor_set(v).into_iter().flatten() {
                match side.get(&u) {
                    Some(&there) if there == here => return false,
                    Some(_) => {}
                    None => {
                        side.insert(u, !here);
                        queue.push_back(u);
                    }
                }
            }
        }
    }
    true
}

/// Connected with `m = n - 1`. The empty graph is not a tree.
pub fn tree(graph: &Graph) -> bool {
    graph.order() > 0 && graph.size() + 1 == graph.order() && graph.is_connected()
}

/// Every vertex has the same degree.
pub fn regular(graph: &Graph) -> bool {
    graph.minimum_degree() == graph.maximum_degree()
}

/// Non-empty and 3-regular.
pub fn cubic(graph: &Graph) -> bool {
    graph.order() > 0 && graph.minimum_degree() == 3 && graph.maximum_degree() == 3
}

/// Maximum degree at most 3.
pub fn subcubic(graph: &Graph) -> bool {
    graph.maximum_degree() <= 3
}

/// Non-empty, connected and every degree even.
pub fn eulerian(graph: &Graph) -> bool {
    graph.order() > 0
        && graph.is_connected()
        && graph.degree_sequence().iter().all(|d| d % 2 == 0)
}

/// No induced cycle longer than three.
///
/// Maximum cardinality search visits vertices in the reverse of a perfect
/// elimination order whenever one exists. Each vertex's earlier-visited
/// neighbors must then form a clique, which reduces to: every one of them
/// except the most recently visited is adjacent to that one.
pub fn chordal(graph: &Graph) -> bool {
    let mut weight: BTreeMap<Vertex, usize> = graph.vertex_iter().map(|v| (v, 0)).collect();
    let mut position: BTreeMap<Vertex, usize> = BTreeMap::new();

    while let Some(v) = weight
        .iter()
        .max_by(|(a, wa), (b, wb)| wa.cmp(wb).then(b.cmp(a)))
        .map(|(&v, _)| v)
    {
        weight.remove(&v);
        let neighbors = graph.neighbor_set(v).cloned().unwrap_or_default();

        let earlier: Vec<Vertex> = neighbors
            .iter()
            .copied()
            .filter(|u| position.contains_key(u))
            .collect();
        if let Some(&parent) = earlier.iter().max_by_key(|u| position[*u]) {
            if earlier
                .iter()
                .any(|&u| u != parent && !graph.has_edge(u, parent))
            {
                return false;
            }
        }

        position.insert(v, position.len());
        for u in &neighbors {
            if let Some(w) = weight.get_mut(u) {
                *w += 1;
            }
        }
    }
    true
}

pub fn connected_and_bipartite(graph: &Graph) -> bool {
    connected(graph) && bipartite(graph)
}

pub fn connected_and_regular(graph: &Graph) -> bool {
    connected(graph) && regular(graph)
}

pub fn connected_and_eulerian(graph: &Graph) -> bool {
    eulerian(graph)
}

pub fn connected_and_cubic(graph: &Graph) -> bool {
    connected(graph) && cubic(graph)
}

pub fn connected_and_subcubic(graph: &Graph) -> bool {
    connected(graph) && subcubic(graph)
}

pub fn connected_and_chordal(graph: &Graph) -> bool {
    connected(graph) && chordal(graph)
}
