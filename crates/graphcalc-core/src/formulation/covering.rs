//! # Covering Formulations
//!
//! Vertex and edge covers and the domination family. All models minimize.
//!
//! Vertices whose covering row cannot be satisfied (an isolated vertex in
//! total domination or edge cover) keep their row with an empty left-hand
//! side, so the model is reported infeasible rather than silently relaxed.

use super::{coefficient, require_positive, vertex_variables};
use crate::graph::{Graph, GraphView};
use crate::model::{Direction, IlpModel, LinearExpr, Sense, VarId, VarTag, WitnessKind};
use crate::{GraphCalcError, Vertex};
use std::collections::BTreeMap;

fn minimize_sum(model: &mut IlpModel, vars: &BTreeMap<Vertex, VarId>) {
    for var in vars.values() {
        model.add_objective_term(*var, 1);
    }
}

fn neighbor_sum(
    graph: &Graph,
    v: Vertex,
    vars: &BTreeMap<Vertex, VarId>,
) -> Result<LinearExpr, GraphCalcError> {
    Ok(LinearExpr::sum(graph.neighbor_set(v)?.iter().map(|u| vars[u])))
}

/// Closed-neighborhood domination rows `x_v + Σ_{N(v)} x_u >= 1`.
fn add_domination_rows(
    model: &mut IlpModel,
    graph: &Graph,
    x: &BTreeMap<Vertex, VarId>,
) -> Result<(), GraphCalcError> {
    for v in graph.vertex_iter() {
        let expr = neighbor_sum(graph, v, x)?.with_term(x[&v], 1);
        model.add_constraint(format!("dominate_{}", v), expr, Sense::GreaterEq, 1);
    }
    Ok(())
}

/// Minimum vertex cover: `x_u + x_v >= 1` per edge.
pub fn vertex_cover_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new(
        "minimum_vertex_cover",
        Direction::Minimize,
        WitnessKind::VertexSet,
    );
    let x = vertex_variables(&mut model, graph, "x");
    for edge in GraphView::edges(graph) {
        model.add_constraint(
            format!("cover_{}_{}", edge.first(), edge.second()),
            LinearExpr::sum([x[&edge.first()], x[&edge.second()]]),
            Sense::GreaterEq,
            1,
        );
    }
    minimize_sum(&mut model, &x);
    Ok(model)
}

/// Minimum edge cover: every vertex meets a chosen edge.
///
/// Infeasible when the graph has an isolated vertex.
pub fn edge_cover_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new("minimum_edge_cover", Direction::Minimize, WitnessKind::EdgeSet);
    let mut incident: BTreeMap<Vertex, LinearExpr> =
        graph.vertex_iter().map(|v| (v, LinearExpr::new())).collect();
    for edge in GraphView::edges(graph) {
        let var = model.add_binary(
            format!("e_{}_{}", edge.first(), edge.second()),
            VarTag::Edge(edge),
        );
        model.add_objective_term(var, 1);
        for endpoint in [edge.first(), edge.second()] {
            incident.entry(endpoint).or_default().add_term(var, 1);
        }
    }
    for (v, expr) in incident {
        model.add_constraint(format!("cover_{}", v), expr, Sense::GreaterEq, 1);
    }
    Ok(model)
}

/// Minimum dominating set.
pub fn dominating_set_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new(
        "minimum_dominating_set",
        Direction::Minimize,
        WitnessKind::VertexSet,
    );
    let x = vertex_variables(&mut model, graph, "x");
    add_domination_rows(&mut model, graph, &x)?;
    minimize_sum(&mut model, &x);
    Ok(model)
}

/// Minimum k-dominating set: every vertex outside the set has `k` neighbors in it.
///
/// Encoded as `k·x_v + Σ_{N(v)} x_u >= k`.
pub fn k_dominating_set_model(graph: &Graph, k: usize) -> Result<IlpModel, GraphCalcError> {
    require_positive("k", k)?;
    let k = coefficient("k", k)?;
    let mut model = IlpModel::new(
        format!("minimum_{}_dominating_set", k),
        Direction::Minimize,
        WitnessKind::VertexSet,
    );
    let x = vertex_variables(&mut model, graph, "x");
    for v in graph.vertex_iter() {
        let expr = neighbor_sum(graph, v, &x)?.with_term(x[&v], k);
        model.add_constraint(format!("dominate_{}", v), expr, Sense::GreaterEq, k);
    }
    minimize_sum(&mut model, &x);
    Ok(model)
}

/// Minimum total dominating set: `Σ_{N(v)} x_u >= 1`.
///
/// Infeasible when the graph has an isolated vertex.
pub fn total_dominating_set_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new(
        "minimum_total_dominating_set",
        Direction::Minimize,
        WitnessKind::VertexSet,
    );
    let x = vertex_variables(&mut model, graph, "x");
    for v in graph.vertex_iter() {
        model.add_constraint(
            format!("total_{}", v),
            neighbor_sum(graph, v, &x)?,
            Sense::GreaterEq,
            1,
        );
    }
    minimize_sum(&mut model, &x);
    Ok(model)
}

/// Minimum independent dominating set: domination rows plus edge packing.
pub fn independent_dominating_set_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new(
        "minimum_independent_dominating_set",
        Direction::Minimize,
        WitnessKind::VertexSet,
    );
    let x = vertex_variables(&mut model, graph, "x");
    add_domination_rows(&mut model, graph, &x)?;
    for edge in GraphView::edges(graph) {
        model.add_constraint(
            format!("independent_{}_{}", edge.first(), edge.second()),
            LinearExpr::sum([x[&edge.first()], x[&edge.second()]]),
            Sense::LessEq,
            1,
        );
    }
    minimize_sum(&mut model, &x);
    Ok(model)
}

/// Minimum restrained dominating set.
///
/// Besides domination, a vertex outside the set needs a neighbor outside the
/// set: `Σ_{N(v)} (1 - x_u) >= 1 - x_v`, rearranged to
/// `x_v - Σ_{N(v)} x_u >= 1 - deg(v)`.
pub fn restrained_dominating_set_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new(
        "minimum_restrained_dominating_set",
        Direction::Minimize,
        WitnessKind::VertexSet,
    );
    let x = vertex_variables(&mut model, graph, "x");
    add_domination_rows(&mut model, graph, &x)?;
    for v in graph.vertex_iter() {
        let neighbors = graph.neighbor_set(v)?;
        let mut expr = LinearExpr::new().with_term(x[&v], 1);
        for u in neighbors {
            expr.add_term(x[u], -1);
        }
        let degree = coefficient("degree", neighbors.len())?;
        model.add_constraint(format!("restrained_{}", v), expr, Sense::GreaterEq, 1 - degree);
    }
    minimize_sum(&mut model, &x);
    Ok(model)
}

/// Roman domination: `x_v` costs 1, `y_v` costs 2.
///
/// `x_v + y_v + Σ_{N(v)} y_u >= 1` and `x_v + y_v <= 1`.
pub fn roman_domination_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new("roman_domination", Direction::Minimize, WitnessKind::Labeling);
    let mut x = BTreeMap::new();
    let mut y = BTreeMap::new();
    for v in graph.vertex_iter() {
        x.insert(v, model.add_binary(format!("x_{}", v), VarTag::VertexWeight(v, 1)));
        y.insert(v, model.add_binary(format!("y_{}", v), VarTag::VertexWeight(v, 2)));
    }
    for v in graph.vertex_iter() {
        let expr = neighbor_sum(graph, v, &y)?
            .with_term(x[&v], 1)
            .with_term(y[&v], 1);
        model.add_constraint(format!("dominate_{}", v), expr, Sense::GreaterEq, 1);
        model.add_constraint(
            format!("exclusive_{}", v),
            LinearExpr::sum([x[&v], y[&v]]),
            Sense::LessEq,
            1,
        );
        model.add_objective_term(x[&v], 1);
        model.add_objective_term(y[&v], 2);
    }
    Ok(model)
}

/// Double Roman domination: `x, y, z` cost 1, 2, 3.
///
/// The half-weight row `x + y + z + ½Σy_u + Σz_u >= 1` is doubled to keep
/// integer coefficients: `2x + 2y + 2z + Σy_u + 2Σz_u >= 2`. A vertex labelled
/// 1 also needs a neighbor labelled at least 2, and labels are exclusive.
pub fn double_roman_domination_model(graph: &Graph) -> Result<IlpModel, GraphCalcError> {
    let mut model = IlpModel::new(
        "double_roman_domination",
        Direction::Minimize,
        WitnessKind::Labeling,
    );
    let mut x = BTreeMap::new();
    let mut y = BTreeMap::new();
    let mut z = BTreeMap::new();
    for v in graph.vertex_iter() {
        x.insert(v, model.add_binary(format!("x_{}", v), VarTag::VertexWeight(v, 1)));
        y.insert(v, model.add_binary(format!("y_{}", v), VarTag::VertexWeight(v, 2)));
        z.insert(v, model.add_binary(format!("z_{}", v), VarTag::VertexWeight(v, 3)));
    }
    for v in graph.vertex_iter() {
        let neighbors = graph.neighbor_set(v)?;

        let mut weighted = LinearExpr::new()
            .with_term(x[&v], 2)
            .with_term(y[&v], 2)
            .with_term(z[&v], 2);
        let mut support = LinearExpr::new().with_term(x[&v], -1);
        for u in neighbors {
            weighted.add_term(y[u], 1);
            weighted.add_term(z[u], 2);
            support.add_term(y[u], 1);
            support.add_term(z[u], 1);
        }
        model.add_constraint(format!("dominate_{}", v), weighted, Sense::GreaterEq, 2);
        model.add_constraint(format!("support_{}", v), support, Sense::GreaterEq, 0);
        model.add_constraint(
            format!("exclusive_{}", v),
            LinearExpr::sum([x[&v], y[&v], z[&v]]),
            Sense::LessEq,
            1,
        );
        model.add_objective_term(x[&v], 1);
        model.add_objective_term(y[&v], 2);
        model.add_objective_term(z[&v], 3);
    }
    Ok(model)
}

/// k-rainbow domination: every vertex gets one of `k` colors or none; an
/// uncolored vertex sees all `k` colors in its neighborhood. Minimizes the
/// number of colored vertices.
pub fn rainbow_domination_model(graph: &Graph, k: usize) -> Result<IlpModel, GraphCalcError> {
    require_positive("k", k)?;
    let mut model = IlpModel::new(
        format!("{}_rainbow_domination", k),
        Direction::Minimize,
        WitnessKind::Coloring,
    );
    let mut f: BTreeMap<(Vertex, usize), VarId> = BTreeMap::new();
    let mut uncolored = BTreeMap::new();
    for v in graph.vertex_iter() {
        for i in 0..k {
            let var = model.add_binary(format!("f_{}_{}", v, i), VarTag::VertexColor(v, i));
            model.add_objective_term(var, 1);
            f.insert((v, i), var);
        }
        uncolored.insert(v, model.add_binary(format!("u_{}", v), VarTag::Auxiliary));
    }
    for v in graph.vertex_iter() {
        let assignment =
            LinearExpr::sum((0..k).map(|i| f[&(v, i)])).with_term(uncolored[&v], 1);
        model.add_constraint(format!("assign_{}", v), assignment, Sense::Equal, 1);

        let neighbors = graph.neighbor_set(v)?;
        for i in 0..k {
            let seen = LinearExpr::sum(neighbors.iter().map(|u| f[&(*u, i)]))
                .with_term(uncolored[&v], -1);
            model.add_constraint(format!("rainbow_{}_{}", v, i), seen, Sense::GreaterEq, 0);
        }
    }
    Ok(model)
}
