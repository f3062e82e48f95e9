//! # Solve Orchestrator
//!
//! Runs a formulated model on a resolved backend and interprets the outcome.
//!
//! ## Status Mapping
//!
//! | Backend | Result |
//! |---------|--------|
//! | optimal | `Optimal` |
//! | limit hit, incumbent | `BestFoundUnproven` |
//! | limit hit, no incumbent | `TimeLimitWithoutSolution` error |
//! | infeasible | `Infeasible` |
//!
//! A `BestFoundUnproven` result is never reported as `Optimal`.

use crate::model::{IlpModel, VarTag, WitnessKind};
use crate::primitives::ROUNDING_TOLERANCE;
use crate::solver::{
    BackendStatus, LogSink, RunOptions, SolverCache, SolverDescriptor, SolverEnvironment,
    SolverOptions, SolverSpec,
};
use crate::{Edge, GraphCalcError, Vertex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// =============================================================================
// RESULTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    BestFoundUnproven,
    Infeasible,
}

/// Evidence for an invariant value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Witness {
    None,
    VertexSet(BTreeSet<Vertex>),
    EdgeSet(BTreeSet<Edge>),
    /// Vertex to color index.
    Coloring(BTreeMap<Vertex, usize>),
    /// Vertex to weight, for Roman-type functions.
    Labeling(BTreeMap<Vertex, i64>),
}

impl Witness {
    /// The vertex set, if this is a vertex-set witness.
    #[must_use]
    pub fn vertex_set(&self) -> Option<&BTreeSet<Vertex>> {
        match self {
            Self::VertexSet(set) => Some(set),
            _ => None,
        }
    }
}

/// Value, witness and proof status of one invariant evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantResult {
    /// Absent only when infeasible.
    pub value: Option<i64>,
    pub witness: Witness,
    pub status: SolveStatus,
}

impl InvariantResult {
    #[must_use]
    pub fn optimal(value: i64, witness: Witness) -> Self {
        Self {
            value: Some(value),
            witness,
            status: SolveStatus::Optimal,
        }
    }

    #[must_use]
    pub fn infeasible() -> Self {
        Self {
            value: None,
            witness: Witness::None,
            status: SolveStatus::Infeasible,
        }
    }

    /// The value as a plain integer, only if it was proved optimal.
    pub fn optimal_value(&self) -> Result<i64, GraphCalcError> {
        match (self.status, self.value) {
            (SolveStatus::Optimal, Some(value)) => Ok(value),
            (SolveStatus::BestFoundUnproven, Some(best)) => {
                Err(GraphCalcError::NotProvenOptimal { best })
            }
            _ => Err(GraphCalcError::Infeasible),
        }
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Nearest integer to a backend-reported value, within `ROUNDING_TOLERANCE`.
#[allow(clippy::float_arithmetic)]
fn round_reported(reported: f64) -> Result<i64, GraphCalcError> {
    let nearest = reported.round();
    if !nearest.is_finite() {
        return Err(GraphCalcError::BackendFailure(format!(
            "non-finite value {} reported",
            reported
        )));
    }
    let nearest_int = nearest as i64;
    if (reported - nearest).abs() > ROUNDING_TOLERANCE {
        return Err(GraphCalcError::RoundingOutOfTolerance {
            reported,
            nearest: nearest_int,
        });
    }
    Ok(nearest_int)
}

fn decode_witness(model: &IlpModel, values: &[i64]) -> Witness {
    let chosen = || {
        model
            .variables()
            .iter()
            .zip(values)
            .filter(|(_, value)| **value > 0)
            .map(|(var, _)| var.tag)
    };
    match model.witness_kind() {
        WitnessKind::None => Witness::None,
        WitnessKind::VertexSet => Witness::VertexSet(
            chosen()
                .filter_map(|tag| match tag {
                    VarTag::Vertex(v) => Some(v),
                    _ => None,
                })
                .collect(),
        ),
        WitnessKind::EdgeSet => Witness::EdgeSet(
            chosen()
                .filter_map(|tag| match tag {
                    VarTag::Edge(e) => Some(e),
                    _ => None,
                })
                .collect(),
        ),
        WitnessKind::Coloring => Witness::Coloring(
            chosen()
                .filter_map(|tag| match tag {
                    VarTag::VertexColor(v, color) => Some((v, color)),
                    _ => None,
                })
                .collect(),
        ),
        WitnessKind::Labeling => {
            let mut labels: BTreeMap<Vertex, i64> = model
                .variables()
                .iter()
                .filter_map(|var| match var.tag {
                    VarTag::VertexWeight(v, _) => Some((v, 0)),
                    _ => None,
                })
                .collect();
            for tag in chosen() {
                if let VarTag::VertexWeight(v, weight) = tag {
                    *labels.entry(v).or_insert(0) += weight;
                }
            }
            Witness::Labeling(labels)
        }
    }
}

fn empty_witness(kind: WitnessKind) -> Witness {
    match kind {
        WitnessKind::None => Witness::None,
        WitnessKind::VertexSet => Witness::VertexSet(BTreeSet::new()),
        WitnessKind::EdgeSet => Witness::EdgeSet(BTreeSet::new()),
        WitnessKind::Coloring => Witness::Coloring(BTreeMap::new()),
        WitnessKind::Labeling => Witness::Labeling(BTreeMap::new()),
    }
}

/// Answer a model without variables: its objective is 0 when every row holds.
fn trivial_result(model: &IlpModel) -> InvariantResult {
    if model.is_feasible(&[]) {
        InvariantResult::optimal(0, empty_witness(model.witness_kind()))
    } else {
        InvariantResult::infeasible()
    }
}

/// Execute `model` on `spec` under `run`.
pub fn execute(
    model: &IlpModel,
    spec: &SolverSpec,
    run: &RunOptions,
) -> Result<InvariantResult, GraphCalcError> {
    if model.num_variables() == 0 {
        debug!(model = model.name(), "model has no variables, skipping backend");
        return Ok(trivial_result(model));
    }

    info!(
        model = model.name(),
        backend = spec.name(),
        variables = model.num_variables(),
        constraints = model.constraints().len(),
        "solving"
    );
    let solution = spec.solve(model, run)?;

    if run.verbose {
        let sink = run.log_sink.clone().unwrap_or_else(LogSink::tracing);
        for line in &solution.log {
            sink.emit(line);
        }
    }

    let status = match solution.status {
        BackendStatus::Infeasible => return Ok(InvariantResult::infeasible()),
        BackendStatus::LimitWithoutIncumbent => {
            return Err(GraphCalcError::TimeLimitWithoutSolution);
        }
        BackendStatus::Optimal => SolveStatus::Optimal,
        BackendStatus::LimitWithIncumbent => SolveStatus::BestFoundUnproven,
    };

    if solution.values.len() != model.num_variables() {
        return Err(GraphCalcError::BackendFailure(format!(
            "{} reported {} values for {} variables",
            spec.name(),
            solution.values.len(),
            model.num_variables()
        )));
    }
    let values = solution
        .values
        .iter()
        .map(|v| round_reported(*v))
        .collect::<Result<Vec<i64>, _>>()?;
    if !model.is_feasible(&values) {
        return Err(GraphCalcError::BackendFailure(format!(
            "{} returned a point that violates the model",
            spec.name()
        )));
    }

    let value = model.objective_value(&values);
    if let Some(objective) = solution.objective {
        let reported = round_reported(objective)?;
        if reported != value {
            return Err(GraphCalcError::BackendFailure(format!(
                "{} reported objective {} but its values give {}",
                spec.name(),
                reported,
                value
            )));
        }
    }
    debug!(model = model.name(), value, ?status, "solve finished");
    Ok(InvariantResult {
        value: Some(value),
        witness: decode_witness(model, &values),
        status,
    })
}

// =============================================================================
// SOLVE CONTEXT
// =============================================================================

/// Everything a solver-backed invariant needs besides the graph.
///
/// The backend is resolved on first use and then reused, so invariants that
/// never build a model never touch the resolver.
#[derive(Debug, Default)]
pub struct SolveContext {
    descriptor: SolverDescriptor,
    options: SolverOptions,
    environment: SolverEnvironment,
    cache: Option<Arc<SolverCache>>,
    run: RunOptions,
    resolved: Mutex<Option<SolverSpec>>,
}

impl SolveContext {
    /// A context with no descriptor and an empty environment snapshot.
    ///
    /// Resolution then auto-detects the in-process backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose environment snapshot is captured from the process.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().with_environment(SolverEnvironment::capture())
    }

    #[must_use]
    pub fn with_descriptor(mut self, descriptor: SolverDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: SolverEnvironment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<SolverCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_run_options(mut self, run: RunOptions) -> Self {
        self.run = run;
        self
    }

    #[must_use]
    pub fn run_options(&self) -> &RunOptions {
        &self.run
    }

    #[must_use]
    pub fn environment(&self) -> &SolverEnvironment {
        &self.environment
    }

    /// Whether a backend has been resolved yet.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved_slot().is_some()
    }

    fn resolved_slot(&self) -> std::sync::MutexGuard<'_, Option<SolverSpec>> {
        match self.resolved.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Resolve (once) and return the backend for this context.
    pub fn spec(&self) -> Result<SolverSpec, GraphCalcError> {
        let mut slot = self.resolved_slot();
        if let Some(spec) = slot.as_ref() {
            return Ok(spec.clone());
        }
        let spec = match &self.cache {
            Some(cache) => cache.resolve(&self.descriptor, &self.options, &self.environment)?,
            None => crate::solver::resolve(&self.descriptor, &self.options, &self.environment)?,
        };
        *slot = Some(spec.clone());
        Ok(spec)
    }

    /// Resolve the backend, then solve a model.
    ///
    /// Resolution happens even for models without variables, so a bad
    /// descriptor fails the same way on every graph.
    pub fn solve(&self, model: &IlpModel) -> Result<InvariantResult, GraphCalcError> {
        let spec = self.spec()?;
        execute(model, &spec, &self.run)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, LinearExpr, Sense};
    use crate::solver::{BackendLocation, BackendSolution, MilpBackend};

    /// A backend that replays a fixed solution.
    #[derive(Debug)]
    struct Scripted(BackendSolution);

    impl MilpBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn location(&self) -> BackendLocation {
            BackendLocation::InProcess
        }

        fn solve(
            &self,
            _model: &IlpModel,
            _run: &RunOptions,
        ) -> Result<BackendSolution, GraphCalcError> {
            Ok(self.0.clone())
        }
    }

    fn scripted(status: BackendStatus, values: Vec<f64>) -> SolverSpec {
        SolverSpec::new(
            Arc::new(Scripted(BackendSolution {
                status,
                objective: None,
                values,
                log: vec!["line one".to_string()],
            })),
            SolverOptions::new(),
        )
    }

    fn edge_packing() -> IlpModel {
        let mut model = IlpModel::new("pack", Direction::Maximize, WitnessKind::VertexSet);
        let a = model.add_binary("a", VarTag::Vertex(Vertex(0)));
        let b = model.add_binary("b", VarTag::Vertex(Vertex(1)));
        model.add_constraint("edge", LinearExpr::sum([a, b]), Sense::LessEq, 1);
        model.add_objective_term(a, 1);
        model.add_objective_term(b, 1);
        model
    }

    #[test]
    fn optimal_values_are_rounded() {
        let spec = scripted(BackendStatus::Optimal, vec![0.9999999, 1e-9]);
        let result = execute(&edge_packing(), &spec, &RunOptions::default()).expect("result");
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.value, Some(1));
        assert_eq!(result.optimal_value().expect("value"), 1);
        let expected: BTreeSet<_> = [Vertex(0)].into_iter().collect();
        assert_eq!(result.witness, Witness::VertexSet(expected));
    }

    #[test]
    fn values_outside_tolerance_fail() {
        let spec = scripted(BackendStatus::Optimal, vec![0.5, 0.0]);
        let result = execute(&edge_packing(), &spec, &RunOptions::default());
        assert!(matches!(
            result,
            Err(GraphCalcError::RoundingOutOfTolerance { .. })
        ));
    }

    #[test]
    fn limit_statuses() {
        let unproven = execute(
            &edge_packing(),
            &scripted(BackendStatus::LimitWithIncumbent, vec![0.0, 1.0]),
            &RunOptions::default(),
        )
        .expect("result");
        assert_eq!(unproven.status, SolveStatus::BestFoundUnproven);
        assert!(matches!(
            unproven.optimal_value(),
            Err(GraphCalcError::NotProvenOptimal { best: 1 })
        ));

        let nothing = execute(
            &edge_packing(),
            &scripted(BackendStatus::LimitWithoutIncumbent, Vec::new()),
            &RunOptions::default(),
        );
        assert!(matches!(nothing, Err(GraphCalcError::TimeLimitWithoutSolution)));
    }

    #[test]
    fn infeasible_result_has_no_value() {
        let result = execute(
            &edge_packing(),
            &scripted(BackendStatus::Infeasible, Vec::new()),
            &RunOptions::default(),
        )
        .expect("result");
        assert_eq!(result.status, SolveStatus::Infeasible);
        assert!(matches!(result.optimal_value(), Err(GraphCalcError::Infeasible)));
    }

    #[test]
    fn violating_point_is_a_backend_failure() {
        let spec = scripted(BackendStatus::Optimal, vec![1.0, 1.0]);
        let result = execute(&edge_packing(), &spec, &RunOptions::default());
        assert!(matches!(result, Err(GraphCalcError::BackendFailure(_))));
    }

    #[test]
    fn verbose_forwards_log_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let run = RunOptions::default()
            .with_verbose(true)
            .with_log_sink(LogSink::new(move |line| {
                captured.lock().expect("lock").push(line.to_string());
            }));
        let spec = scripted(BackendStatus::Optimal, vec![1.0, 0.0]);
        execute(&edge_packing(), &spec, &run).expect("result");
        assert_eq!(*lines.lock().expect("lock"), vec!["line one"]);
    }

    #[test]
    fn empty_model_still_resolves() {
        let model = IlpModel::new("empty", Direction::Maximize, WitnessKind::VertexSet);

        let bad = SolveContext::new().with_descriptor(SolverDescriptor::name("gurobi"));
        assert!(matches!(bad.solve(&model), Err(GraphCalcError::UnknownBackend(name)) if name == "gurobi"));

        let good = SolveContext::new();
        let result = good.solve(&model).expect("result");
        assert_eq!(result.value, Some(0));
        assert!(good.is_resolved());
    }

    #[test]
    fn empty_model_never_reaches_the_backend() {
        let spec = scripted(BackendStatus::Infeasible, Vec::new());
        let model = IlpModel::new("empty", Direction::Minimize, WitnessKind::VertexSet);
        let result = execute(&model, &spec, &RunOptions::default()).expect("result");
        assert_eq!(result.optimal_value().expect("value"), 0);
    }

    #[test]
    fn reported_objective_must_match_values() {
        let mut solution = BackendSolution {
            status: BackendStatus::Optimal,
            objective: Some(1.0),
            values: vec![1.0, 0.0],
            log: Vec::new(),
        };
        let agreeing = SolverSpec::new(Arc::new(Scripted(solution.clone())), SolverOptions::new());
        let result = execute(&edge_packing(), &agreeing, &RunOptions::default()).expect("result");
        assert_eq!(result.value, Some(1));

        solution.objective = Some(2.0);
        let lying = SolverSpec::new(Arc::new(Scripted(solution)), SolverOptions::new());
        let result = execute(&edge_packing(), &lying, &RunOptions::default());
        assert!(matches!(result, Err(GraphCalcError::BackendFailure(_))));
    }

    #[test]
    fn context_resolves_once() {
        let context = SolveContext::new();
        let result = context.solve(&edge_packing()).expect("result");
        assert_eq!(result.optimal_value().expect("value"), 1);
        assert!(context.is_resolved());
        assert_eq!(context.spec().expect("spec").name(), "bnb");
    }
}
