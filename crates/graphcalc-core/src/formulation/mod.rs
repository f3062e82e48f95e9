//! # Invariant Formulations
//!
//! Pure functions from a graph (and parameters) to either an `IlpModel` or,
//! for the search-based and degree-based invariants, a value directly.
//!
//! | Module | Family | Solver |
//! |--------|--------|--------|
//! | `packing` | independent set, clique, matching | ILP |
//! | `covering` | covers and the domination family | ILP |
//! | `coloring` | chromatic number | ILP |
//! | `forcing` | zero forcing family, power domination, outer-connected domination | subset search |
//! | `degree` | degree-sequence bounds | none |
//! | `basics` | structural invariants and predicates | none |
//!
//! Parameters are validated before any model is built.

pub mod basics;
pub mod coloring;
pub mod covering;
pub mod degree;
pub mod forcing;
pub mod packing;

use crate::graph::Graph;
use crate::model::{IlpModel, VarId, VarTag};
use crate::{GraphCalcError, Vertex};
use std::collections::BTreeMap;

/// One binary per vertex, tagged as vertex-set membership.
pub(crate) fn vertex_variables(
    model: &mut IlpModel,
    graph: &Graph,
    prefix: &str,
) -> BTreeMap<Vertex, VarId> {
    graph
        .vertex_iter()
        .map(|v| {
            let var = model.add_binary(format!("{}_{}", prefix, v), VarTag::Vertex(v));
            (v, var)
        })
        .collect()
}

/// Reject `k < 1`.
pub(crate) fn require_positive(name: &'static str, k: usize) -> Result<(), GraphCalcError> {
    if k == 0 {
        return Err(GraphCalcError::InvalidParameter {
            name,
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(())
}

/// Convert a parameter to a model coefficient.
pub(crate) fn coefficient(name: &'static str, k: usize) -> Result<i64, GraphCalcError> {
    i64::try_from(k).map_err(|_| GraphCalcError::InvalidParameter {
        name,
        reason: format!("{} does not fit a model coefficient", k),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Brute-force checks shared by the formulation tests.

    use crate::orchestrator::{InvariantResult, SolveContext};
    use crate::model::IlpModel;

    pub fn solve(model: &IlpModel) -> InvariantResult {
        SolveContext::new().solve(model).expect("solve")
    }

    pub fn value(model: &IlpModel) -> i64 {
        solve(model).optimal_value().expect("optimal")
    }
}
