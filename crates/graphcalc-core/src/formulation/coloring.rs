//! Chromatic number as an assignment model.

use crate::graph::{Graph, GraphView};
use crate::model::{Direction, IlpModel, LinearExpr, Sense, VarId, VarTag, WitnessKind};
use crate::{GraphCalcError, Vertex};
use std::collections::BTreeMap;

/// Minimum proper coloring.
///
/// With `c = min(n, Δ + 1)` candidate colors: `x_{v,i}` assigns color `i` to
/// `v`, `w_i` marks color `i` as used. Each vertex takes exactly one color,
/// adjacent vertices differ, `x_{v,i} <= w_i`, and `w_i >= w_{i+1}` so colors
/// are used in index order. Minimizes `Σ w`.
pub fn coloring_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let colors = graph.order().min(graph.maximum_degree() + 1);
    let mut model = IlpModel::new("minimum_coloring", Direction::Minimize, WitnessKind::Coloring);

    let used: Vec<VarId> = (0..colors)
        .map(|i| model.add_binary(format!("w_{}", i), VarTag::Auxiliary))
        .collect();
    let mut assign: BTreeMap<(Vertex, usize), VarId> = BTreeMap::new();
    for v in graph.vertex_iter() {
        for i in 0..colors {
            let var = model.add_binary(format!("x_{}_{}", v, i), VarTag::VertexColor(v, i));
            assign.insert((v, i), var);
        }
    }

    for v in graph.vertex_iter() {
        model.add_constraint(
            format!("one_color_{}", v),
            LinearExpr::sum((0..colors).map(|i| assign[&(v, i)])),
            Sense::Equal,
            1,
        );
        for (i, w) in used.iter().enumerate() {
            model.add_constraint(
                format!("uses_{}_{}", v, i),
                LinearExpr::new()
                    .with_term(assign[&(v, i)], 1)
                    .with_term(*w, -1),
                Sense::LessEq,
                0,
            );
        }
    }

    for edge in GraphView::edges(graph) {
        for i in 0..colors {
            model.add_constraint(
                format!("proper_{}_{}_{}", edge.first(), edge.second(), i),
                LinearExpr::sum([assign[&(edge.first(), i)], assign[&(edge.second(), i)]]),
                Sense::LessEq,
                1,
            );
        }
    }

    for pair in used.windows(2) {
        model.add_constraint(
            format!("order_{}", pair[1].index()),
            LinearExpr::new().with_term(pair[0], 1).with_term(pair[1], -1),
            Sense::GreaterEq,
            0,
        );
    }

    for w in &used {
        model.add_objective_term(*w, 1);
    }
    Ok(model)
}
