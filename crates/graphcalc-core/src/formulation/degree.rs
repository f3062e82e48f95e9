//! # Degree-Sequence Invariants
//!
//! Closed-form bounds computed from the degree sequence alone. All arithmetic
//! is integer or exact rational; none of these call a solver.

use super::require_positive;
use crate::graph::{Graph, GraphView};
use crate::{GraphCalcError, Ratio};

/// Smallest degree, 0 for the empty graph.
pub fn minimum_degree(graph: &Graph) -> usize {
    graph.minimum_degree()
}

/// Largest degree, 0 for the empty graph.
pub fn maximum_degree(graph: &Graph) -> usize {
    graph.maximum_degree()
}

/// `2m / n`, reduced. The empty graph has average degree 0.
pub fn average_degree(graph: &Graph) -> Result<Ratio, GraphCalcError> {
    if graph.order() == 0 {
        return Ok(Ratio::integer(0));
    }
    Ratio::new(2 * graph.size() as i64, graph.order() as i64)
}

/// Smallest `t` with `t + (d_1 + ... + d_t) / k >= n`, degrees in
/// non-increasing order.
pub fn sub_k_domination_number(graph: &Graph, k: usize) -> Result<usize, GraphCalcError> {
    require_positive("k", k)?;
    Ok(sub_k(&graph.degree_sequence(), k))
}

/// The Slater number, `sub_k_domination_number(G, 1)`.
pub fn slater(graph: &Graph) -> usize {
    sub_k(&graph.degree_sequence(), 1)
}

/// Compared as `t·k + Σ d >= n·k`; `t = n` always qualifies.
fn sub_k(degrees: &[usize], k: usize) -> usize {
    let n = degrees.len();
    let mut prefix = 0;
    for (t, d) in degrees.iter().enumerate() {
        if t * k + prefix >= n * k {
            return t;
        }
        prefix += d;
    }
    n
}

/// Smallest `t` with `d_1 + ... + d_t >= n`.
///
/// Undefined (`None`) when even the full degree sum stays below `n`.
pub fn sub_total_domination_number(graph: &Graph) -> Option<usize> {
    let degrees = graph.degree_sequence();
    let n = degrees.len();
    let mut prefix = 0;
    for t in 0..=n {
        if prefix >= n {
            return Some(t);
        }
        prefix += degrees.get(t).copied().unwrap_or(0);
    }
    None
}

/// Largest `t` with `d_1 + ... + d_t <= m`, degrees in non-decreasing order.
pub fn annihilation_number(graph: &Graph) -> usize {
    let mut degrees = graph.degree_sequence();
    degrees.reverse();
    let m = graph.size();
    let mut prefix = 0;
    let mut t = 0;
    for d in degrees {
        prefix += d;
        if prefix > m {
            break;
        }
        t += 1;
    }
    t
}

/// Number of zeros left by the Havel–Hakimi process.
pub fn residue(graph: &Graph) -> usize {
    let mut degrees = graph.degree_sequence();
    loop {
        match degrees.first() {
            Some(&d) if d > 0 => {
                degrees.remove(0);
                // A realized sequence is graphical, so `d <= degrees.len()`.
                for x in degrees.iter_mut().take(d) {
                    *x = x.saturating_sub(1);
                }
                degrees.sort_unstable_by(|a, b| b.cmp(a));
            }
            _ => return degrees.len(),
        }
    }
}

/// `Σ_{uv ∈ E} 2 / (d(u) + d(v))` as an exact fraction.
pub fn harmonic_index(graph: &Graph) -> Result<Ratio, GraphCalcError> {
    let mut total = Ratio::integer(0);
    for edge in GraphView::edges(graph) {
        let sum = graph.degree(edge.first())? + graph.degree(edge.second())?;
        total = total.checked_add(Ratio::new(2, sum as i64)?)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{complete_graph, cycle_graph, path_graph, star_graph};

    #[test]
    fn degree_extremes_and_average() {
        let star = star_graph(4);
        assert_eq!(minimum_degree(&star), 1);
        assert_eq!(maximum_degree(&star), 4);
        assert_eq!(average_degree(&star).expect("ratio"), Ratio::new(8, 5).expect("ratio"));
        assert_eq!(average_degree(&Graph::new()).expect("ratio"), Ratio::integer(0));
    }

    #[test]
    fn slater_numbers() {
        assert_eq!(slater(&cycle_graph(4)), 2);
        assert_eq!(slater(&path_graph(5)), 2);
        assert_eq!(slater(&complete_graph(5)), 1);
        assert_eq!(slater(&Graph::new()), 0);
        assert_eq!(slater(&Graph::with_order(3)), 3);
    }

    #[test]
    fn sub_k_domination_generalizes_slater() {
        for graph in [cycle_graph(4), path_graph(5), complete_graph(5), star_graph(3)] {
            assert_eq!(sub_k_domination_number(&graph, 1).expect("value"), slater(&graph));
        }
        // C6, k = 2: t + t >= 6.
        assert_eq!(sub_k_domination_number(&cycle_graph(6), 2).expect("value"), 3);
        assert!(matches!(
            sub_k_domination_number(&cycle_graph(6), 0),
            Err(GraphCalcError::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn sub_total_domination_numbers() {
        assert_eq!(sub_total_domination_number(&cycle_graph(6)), Some(3));
        assert_eq!(sub_total_domination_number(&path_graph(4)), Some(2));
        assert_eq!(sub_total_domination_number(&complete_graph(5)), Some(2));
        assert_eq!(sub_total_domination_number(&Graph::with_order(2)), None);
    }

    #[test]
    fn annihilation_numbers() {
        assert_eq!(annihilation_number(&cycle_graph(6)), 3);
        assert_eq!(annihilation_number(&path_graph(5)), 3);
        assert_eq!(annihilation_number(&complete_graph(5)), 2);
        assert_eq!(annihilation_number(&star_graph(4)), 4);
    }

    #[test]
    fn residues() {
        assert_eq!(residue(&path_graph(4)), 2);
        assert_eq!(residue(&complete_graph(4)), 1);
        assert_eq!(residue(&cycle_graph(5)), 2);
        assert_eq!(residue(&Graph::with_order(3)), 3);
        assert_eq!(residue(&Graph::new()), 0);
    }

    #[test]
    fn harmonic_indices_are_exact() {
        assert_eq!(harmonic_index(&path_graph(4)).expect("ratio"), Ratio::new(11, 6).expect("ratio"));
        assert_eq!(harmonic_index(&complete_graph(3)).expect("ratio"), Ratio::new(3, 2).expect("ratio"));
        assert_eq!(harmonic_index(&Graph::with_order(2)).expect("ratio"), Ratio::integer(0));
    }
}
