//! # Invariant API
//!
//! One function per solver-backed invariant: build the model, solve it in the
//! given context, return the `InvariantResult`. Search-based invariants are
//! re-exported from `formulation::forcing` unchanged; they take no context
//! because they never resolve a backend.
//!
//! ```text
//! let ctx = SolveContext::from_env();
//! let alpha = independence_number(&graph, &ctx)?.optimal_value()?;
//! ```

use crate::formulation::{coloring, covering, packing};
use crate::graph::Graph;
use crate::orchestrator::{InvariantResult, SolveContext, Witness};
use crate::{Edge, GraphCalcError};
use std::collections::BTreeSet;
use tracing::debug;

pub use crate::formulation::forcing::{
    connected_k_forcing, connected_zero_forcing, k_forcing, k_power_domination,
    outer_connected_domination, power_domination, psd_zero_forcing, total_zero_forcing,
    zero_forcing,
};

// =============================================================================
// PACKING
// =============================================================================

/// α(G), witnessed by a maximum independent set.
pub fn independence_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&packing::independent_set_model(graph)?)
}

/// ω(G), witnessed by a maximum clique.
pub fn clique_number(graph: &Graph, ctx: &SolveContext) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&packing::clique_model(graph)?)
}

/// ν(G), witnessed by a maximum matching.
pub fn matching_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&packing::matching_model(graph)?)
}

// =============================================================================
// COVERING
// =============================================================================

/// τ(G).
pub fn vertex_cover_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::vertex_cover_model(graph)?)
}

/// ρ(G). Infeasible when the graph has an isolated vertex.
pub fn edge_cover_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::edge_cover_model(graph)?)
}

/// γ(G).
pub fn domination_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::dominating_set_model(graph)?)
}

/// γ_k(G).
pub fn k_domination_number(
    graph: &Graph,
    k: usize,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::k_dominating_set_model(graph, k)?)
}

/// γ_t(G). Infeasible when the graph has an isolated vertex.
pub fn total_domination_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::total_dominating_set_model(graph)?)
}

/// i(G).
pub fn independent_domination_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::independent_dominating_set_model(graph)?)
}

/// γ_r(G).
pub fn restrained_domination_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::restrained_dominating_set_model(graph)?)
}

/// γ_R(G), witnessed by a labeling with weights in {0, 1, 2}.
pub fn roman_domination_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::roman_domination_model(graph)?)
}

/// γ_dR(G), witnessed by a labeling with weights in {0, 1, 2, 3}.
pub fn double_roman_domination_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::double_roman_domination_model(graph)?)
}

/// γ_rk(G), witnessed by the color assigned to each colored vertex.
pub fn rainbow_domination_number(
    graph: &Graph,
    k: usize,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&covering::rainbow_domination_model(graph, k)?)
}

/// Smallest maximal matching, via the domination number of the line graph.
///
/// The witness is a minimum edge dominating set of `graph`, which has the
/// same size but need not itself be a matching.
pub fn min_maximal_matching_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    let (line, edges) = graph.line_graph();
    debug!(edges = edges.len(), "minimum maximal matching via line graph");
    let mut result = ctx.solve(&covering::dominating_set_model(&line)?)?;
    if let Witness::VertexSet(chosen) = &result.witness {
        let mapped: BTreeSet<Edge> = chosen
            .iter()
            .filter_map(|v| usize::try_from(v.0).ok().and_then(|i| edges.get(i)).copied())
            .collect();
        result.witness = Witness::EdgeSet(mapped);
    }
    Ok(result)
}

// =============================================================================
// PARTITIONING
// =============================================================================

/// χ(G), witnessed by a proper coloring with colors `0..χ`.
pub fn chromatic_number(
    graph: &Graph,
    ctx: &SolveContext,
) -> Result<InvariantResult, GraphCalcError> {
    ctx.solve(&coloring::coloring_model(graph)?)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::generators::{complete_graph, cycle_graph, path_graph, petersen_graph, star_graph};

    fn value(result: Result<InvariantResult, GraphCalcError>) -> i64 {
        result.expect("result").optimal_value().expect("optimal")
    }

    #[test]
    fn packing_and_covering_on_small_graphs() {
        let ctx = SolveContext::new();
        assert_eq!(value(independence_number(&cycle_graph(6), &ctx)), 3);
        assert_eq!(value(domination_number(&cycle_graph(6), &ctx)), 2);
        assert_eq!(value(clique_number(&complete_graph(4), &ctx)), 4);
        assert_eq!(value(vertex_cover_number(&complete_graph(4), &ctx)), 3);
        assert_eq!(value(matching_number(&path_graph(6), &ctx)), 3);
        assert_eq!(value(chromatic_number(&cycle_graph(5), &ctx)), 3);
    }

    #[test]
    fn one_resolution_serves_many_invariants() {
        let ctx = SolveContext::new();
        assert!(!ctx.is_resolved());
        value(independence_number(&petersen_graph(), &ctx));
        assert!(ctx.is_resolved());
        let first = ctx.spec().expect("spec");
        value(domination_number(&petersen_graph(), &ctx));
        assert!(first.same_backend(&ctx.spec().expect("spec")));
    }

    #[test]
    fn search_invariants_leave_context_unresolved() {
        let ctx = SolveContext::new();
        assert_eq!(value(zero_forcing(&path_graph(4))), 1);
        assert!(!ctx.is_resolved());
    }

    #[test]
    fn min_maximal_matching_maps_back_to_edges() {
        let ctx = SolveContext::new();
        // P5: no single edge is maximal, {01, 23} is.
        let result = min_maximal_matching_number(&path_graph(5), &ctx).expect("result");
        assert_eq!(result.optimal_value().expect("optimal"), 2);
        let Witness::EdgeSet(edges) = &result.witness else {
            panic!("expected an edge set");
        };
        assert_eq!(edges.len(), 2);

        assert_eq!(value(min_maximal_matching_number(&star_graph(4), &ctx)), 1);
        assert_eq!(value(min_maximal_matching_number(&complete_graph(4), &ctx)), 2);
    }

    #[test]
    fn parameterized_invariants_validate_k() {
        let ctx = SolveContext::new();
        assert!(matches!(
            k_domination_number(&cycle_graph(6), 0, &ctx),
            Err(GraphCalcError::InvalidParameter { name: "k", .. })
        ));
        assert!(!ctx.is_resolved());
        assert_eq!(value(rainbow_domination_number(&cycle_graph(6), 1, &ctx)), 2);
    }
}
