//! Packing formulations: independent set, clique, matching.

use super::vertex_variables;
use crate::graph::{Graph, GraphView};
use crate::model::{Direction, IlpModel, LinearExpr, Sense, VarTag, WitnessKind};
use crate::GraphCalcError;
use std::collections::BTreeMap;

/// Maximum independent set: `x_u + x_v <= 1` for every edge, maximize `Σ x`.
pub fn independent_set_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new(
        "maximum_independent_set",
        Direction::Maximize,
        WitnessKind::VertexSet,
    );
    let x = vertex_variables(&mut model, graph, "x");
    for edge in GraphView::edges(graph) {
        model.add_constraint(
            format!("edge_{}_{}", edge.first(), edge.second()),
            LinearExpr::sum([x[&edge.first()], x[&edge.second()]]),
            Sense::LessEq,
            1,
        );
    }
    for var in x.values() {
        model.add_objective_term(*var, 1);
    }
    Ok(model)
}

/// Maximum clique: `x_u + x_v <= 1` for every non-adjacent pair.
pub fn clique_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new("maximum_clique", Direction::Maximize, WitnessKind::VertexSet);
    let x = vertex_variables(&mut model, graph, "x");
    let vertices = graph.vertices();
    for (i, &u) in vertices.iter().enumerate() {
        for &v in &vertices[i + 1..] {
            if !graph.has_edge(u, v) {
                model.add_constraint(
                    format!("nonadjacent_{}_{}", u, v),
                    LinearExpr::sum([x[&u], x[&v]]),
                    Sense::LessEq,
                    1,
                );
            }
        }
    }
    for var in x.values() {
        model.add_objective_term(*var, 1);
    }
    Ok(model)
}

/// Maximum matching: one binary per edge, at most one chosen edge per vertex.
pub fn matching_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new("maximum_matching", Direction::Maximize, WitnessKind::EdgeSet);
    let mut incident: BTreeMap<_, LinearExpr> = BTreeMap::new();
    for edge in GraphView::edges(graph) {
        let var = model.add_binary(
            format!("e_{}_{}", edge.first(), edge.second()),
            VarTag::Edge(edge),
        );
        model.add_objective_term(var, 1);
        incident.entry(edge.first()).or_default().add_term(var, 1);
        incident.entry(edge.second()).or_default().add_term(var, 1);
    }
    for (v, expr) in incident {
        model.add_constraint(format!("vertex_{}", v), expr, Sense::LessEq, 1);
    }
    Ok(model)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::formulation::test_support::{solve, value};
    use crate::generators::{complete_graph, cycle_graph, path_graph, petersen_graph, star_graph};
    use crate::orchestrator::Witness;

    #[test]
    fn independence_numbers() {
        assert_eq!(value(&independent_set_model(&cycle_graph(6)).expect("model")), 3);
        assert_eq!(value(&independent_set_model(&cycle_graph(5)).expect("model")), 2);
        assert_eq!(value(&independent_set_model(&petersen_graph()).expect("model")), 4);
        assert_eq!(value(&independent_set_model(&complete_graph(4)).expect("model")), 1);
    }

    #[test]
    fn independent_witness_is_independent() {
        let graph = petersen_graph();
        let result = solve(&independent_set_model(&graph).expect("model"));
        let Witness::VertexSet(set) = &result.witness else {
            panic!("expected a vertex set");
        };
        assert_eq!(set.len(), 4);
        for u in set {
            for v in set {
                assert!(!graph.has_edge(*u, *v));
            }
        }
    }

    #[test]
    fn clique_numbers() {
        assert_eq!(value(&clique_model(&complete_graph(4)).expect("model")), 4);
        assert_eq!(value(&clique_model(&cycle_graph(5)).expect("model")), 2);
        assert_eq!(value(&clique_model(&petersen_graph()).expect("model")), 2);
    }

    #[test]
    fn matching_numbers() {
        assert_eq!(value(&matching_model(&path_graph(6)).expect("model")), 3);
        assert_eq!(value(&matching_model(&complete_graph(4)).expect("model")), 2);
        assert_eq!(value(&matching_model(&star_graph(4)).expect("model")), 1);
        assert_eq!(value(&matching_model(&petersen_graph()).expect("model")), 5);
    }

    #[test]
    fn matching_witness_is_disjoint() {
        let result = solve(&matching_model(&cycle_graph(6)).expect("model"));
        let Witness::EdgeSet(edges) = &result.witness else {
            panic!("expected an edge set");
        };
        assert_eq!(edges.len(), 3);
        for a in edges {
            for b in edges {
                assert!(a == b || !a.shares_endpoint(b));
            }
        }
    }

    #[test]
    fn edgeless_graph_has_no_matching() {
        let graph = Graph::with_order(3);
        let result = solve(&matching_model(&graph).expect("model"));
        assert_eq!(result.value, Some(0));
    }
}
