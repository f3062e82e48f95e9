//! # Graph Generators
//!
//! Named graph families used in tests, benchmarks and the command line.
//! Vertices are labelled `0..n` in the conventional order of each family.

use crate::Vertex;
use crate::graph::Graph;

fn connect(graph: &mut Graph, a: u64, b: u64) {
    if a != b {
        let _ = graph.add_edge(Vertex(a), Vertex(b));
    }
}

/// The edgeless graph on `n` vertices.
#[must_use]
pub fn empty_graph(n: u64) -> Graph {
    Graph::with_order(n).with_name(format!("empty graph on {} vertices", n))
}

/// K_n.
#[must_use]
pub fn complete_graph(n: u64) -> Graph {
    let mut graph = Graph::with_order(n);
    for a in 0..n {
        for b in (a + 1)..n {
            connect(&mut graph, a, b);
        }
    }
    graph.with_name(format!("K{}", n))
}

/// C_n. For `n < 3` this degenerates to the path on `n` vertices.
#[must_use]
pub fn cycle_graph(n: u64) -> Graph {
    let mut graph = Graph::with_order(n);
    for a in 1..n {
        connect(&mut graph, a - 1, a);
    }
    if n >= 3 {
        connect(&mut graph, n - 1, 0);
    }
    graph.with_name(format!("C{}", n))
}

/// P_n.
#[must_use]
pub fn path_graph(n: u64) -> Graph {
    let mut graph = Graph::with_order(n);
    for a in 1..n {
        connect(&mut graph, a - 1, a);
    }
    graph.with_name(format!("P{}", n))
}

/// The star with center `0` and `leaves` leaves.
#[must_use]
pub fn star_graph(leaves: u64) -> Graph {
    let mut graph = Graph::with_order(leaves + 1);
    for leaf in 1..=leaves {
        connect(&mut graph, 0, leaf);
    }
    graph.with_name(format!("star with {} leaves", leaves))
}

/// The wheel on `n` vertices: hub `0` joined to the cycle `1..n`.
#[must_use]
pub fn wheel_graph(n: u64) -> Graph {
    let mut graph = Graph::with_order(n);
    for v in 1..n {
        connect(&mut graph, 0, v);
        if v > 1 {
            connect(&mut graph, v - 1, v);
        }
    }
    if n > 3 {
        connect(&mut graph, n - 1, 1);
    }
    graph.with_name(format!("W{}", n))
}

/// The ladder with `n` rungs: paths `0..n` and `n..2n` joined by `i - (i + n)`.
#[must_use]
pub fn ladder_graph(n: u64) -> Graph {
    let mut graph = Graph::with_order(2 * n);
    for i in 0..n {
        connect(&mut graph, i, i + n);
        if i > 0 {
            connect(&mut graph, i - 1, i);
            connect(&mut graph, i - 1 + n, i + n);
        }
    }
    graph.with_name(format!("ladder with {} rungs", n))
}

/// The `rows x cols` grid. Cell `(r, c)` is vertex `r * cols + c`.
#[must_use]
pub fn grid_2d_graph(rows: u64, cols: u64) -> Graph {
    let mut graph = Graph::with_order(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let v = r * cols + c;
            if c + 1 < cols {
                connect(&mut graph, v, v + 1);
            }
            if r + 1 < rows {
                connect(&mut graph, v, v + cols);
            }
        }
    }
    graph.with_name(format!("{}x{} grid", rows, cols))
}

/// K_{m,n} with parts `0..m` and `m..m+n`.
#[must_use]
pub fn complete_bipartite_graph(m: u64, n: u64) -> Graph {
    let mut graph = Graph::with_order(m + n);
    for a in 0..m {
        for b in m..(m + n) {
            connect(&mut graph, a, b);
        }
    }
    graph.with_name(format!("K{},{}", m, n))
}

/// Two copies of K_`bell` joined by a path through `handle` extra vertices.
#[must_use]
pub fn barbell_graph(bell: u64, handle: u64) -> Graph {
    let mut graph = Graph::with_order(2 * bell + handle);
    let second = bell + handle;
    for a in 0..bell {
        for b in (a + 1)..bell {
            connect(&mut graph, a, b);
            connect(&mut graph, second + a, second + b);
        }
    }
    if bell > 0 {
        // Chain bell - 1, bell, ..., bell + handle.
        for v in bell..=second {
            connect(&mut graph, v - 1, v);
        }
    }
    graph.with_name(format!("barbell({}, {})", bell, handle))
}

/// The Petersen graph: outer 5-cycle `0..5`, spokes `i - i+5`, inner pentagram.
#[must_use]
pub fn petersen_graph() -> Graph {
    let mut graph = Graph::with_order(10);
    for i in 0..5 {
        connect(&mut graph, i, (i + 1) % 5);
        connect(&mut graph, i, i + 5);
        connect(&mut graph, 5 + i, 5 + (i + 2) % 5);
    }
    graph.with_name("Petersen")
}
