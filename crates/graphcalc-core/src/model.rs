//! # Integer Program Model
//!
//! The backend-neutral integer linear program built by every formulation.
//!
//! Coefficients, bounds and right-hand sides are integers. Each variable
//! carries a `VarTag` recording which graph element it encodes, so a solution
//! can be read back as a witness without the formulation being consulted again.

use crate::{Edge, GraphCalcError, Vertex};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// VARIABLES
// =============================================================================

/// Index of a decision variable inside its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl VarId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a decision variable stands for in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarTag {
    /// Membership of a vertex in the chosen set.
    Vertex(Vertex),
    /// Membership of an edge in the chosen set.
    Edge(Edge),
    /// The vertex receives the color with this index.
    VertexColor(Vertex, usize),
    /// Vertex receives the given weight when the variable is set.
    VertexWeight(Vertex, i64),
    /// Helper variable with no witness meaning.
    Auxiliary,
}

/// A bounded integer decision variable. Binaries have bounds `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub lower: i64,
    pub upper: i64,
    pub tag: VarTag,
}

impl Variable {
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.lower == 0 && self.upper == 1
    }
}

// =============================================================================
// LINEAR EXPRESSIONS
// =============================================================================

/// A sparse integer linear expression `Σ c_i · x_i`.
///
/// Terms on the same variable are merged; zero coefficients are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, i64>,
}

impl LinearExpr {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `Σ x_i` over the given variables.
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.add_term(var, 1);
        }
        expr
    }

    /// Builder form of `add_term`.
    #[must_use]
    pub fn with_term(mut self, var: VarId, coefficient: i64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn add_term(&mut self, var: VarId, coefficient: i64) {
        let merged = self.terms.get(&var).copied().unwrap_or(0) + coefficient;
        if merged == 0 {
            self.terms.remove(&var);
        } else {
            self.terms.insert(var, merged);
        }
    }

    /// Terms in variable order.
    pub fn terms(&self) -> impl Iterator<Item = (VarId, i64)> + '_ {
        self.terms.iter().map(|(var, coefficient)| (*var, *coefficient))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Value under a full assignment indexed by `VarId`.
    #[must_use]
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms()
            .map(|(var, coefficient)| coefficient * values.get(var.index()).copied().unwrap_or(0))
            .sum()
    }
}

// =============================================================================
// CONSTRAINTS AND OBJECTIVE
// =============================================================================

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    LessEq,
    GreaterEq,
    Equal,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LessEq => write!(f, "<="),
            Self::GreaterEq => write!(f, ">="),
            Self::Equal => write!(f, "="),
        }
    }
}

/// `expr (<= | >= | =) rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: i64,
}

impl Constraint {
    #[must_use]
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::LessEq => lhs <= self.rhs,
            Sense::GreaterEq => lhs >= self.rhs,
            Sense::Equal => lhs == self.rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objective {
    pub direction: Direction,
    pub expr: LinearExpr,
}

/// How a solution of the model is read back as a witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessKind {
    VertexSet,
    EdgeSet,
    Coloring,
    Labeling,
    None,
}

// =============================================================================
// MODEL
// =============================================================================

/// An integer linear program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlpModel {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,
    witness: WitnessKind,
}

impl IlpModel {
    /// An empty model with the given objective direction.
    #[must_use]
    pub fn new(name: impl Into<String>, direction: Direction, witness: WitnessKind) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: Objective {
                direction,
                expr: LinearExpr::new(),
            },
            witness,
        }
    }

    /// Add a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>, tag: VarTag) -> VarId {
        self.variables.push(Variable {
            name: name.into(),
            lower: 0,
            upper: 1,
            tag,
        });
        VarId(self.variables.len() - 1)
    }

    /// Add an integer variable with bounds `[lower, upper]`.
    pub fn add_integer(
        &mut self,
        name: impl Into<String>,
        lower: i64,
        upper: i64,
        tag: VarTag,
    ) -> Result<VarId, GraphCalcError> {
        if lower > upper {
            return Err(GraphCalcError::InvalidParameter {
                name: "bounds",
                reason: format!("lower bound {} exceeds upper bound {}", lower, upper),
            });
        }
        self.variables.push(Variable {
            name: name.into(),
            lower,
            upper,
            tag,
        });
        Ok(VarId(self.variables.len() - 1))
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        sense: Sense,
        rhs: i64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    /// Add `coefficient · var` to the objective.
    pub fn add_objective_term(&mut self, var: VarId, coefficient: i64) {
        self.objective.expr.add_term(var, coefficient);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[must_use]
    pub fn variable(&self, var: VarId) -> Option<&Variable> {
        self.variables.get(var.index())
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    #[must_use]
    pub fn witness_kind(&self) -> WitnessKind {
        self.witness
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Whether every variable is within bounds and every constraint holds.
    #[must_use]
    pub fn is_feasible(&self, values: &[i64]) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(var, value)| (var.lower..=var.upper).contains(value))
            && self.constraints.iter().all(|c| c.is_satisfied(values))
    }

    /// Objective value under a full assignment.
    #[must_use]
    pub fn objective_value(&self, values: &[i64]) -> i64 {
        self.objective.expr.evaluate(values)
    }
}
