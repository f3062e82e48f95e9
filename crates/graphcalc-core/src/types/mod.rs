//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the engine:
//! - Graph identifiers (`Vertex`, `Edge`)
//! - Table cell values (`PropertyValue`, `Ratio`)
//! - Error types (`GraphCalcError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (ratio-valued invariants are exact fractions)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// GRAPH IDENTIFIERS
// =============================================================================

/// Label of a vertex. Labels are unique within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vertex(pub u64);

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An undirected edge, stored with its smaller endpoint first.
///
/// Two edges compare equal regardless of the order their endpoints were given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge(Vertex, Vertex);

impl Edge {
    /// Create a normalized edge between `a` and `b`.
    #[must_use]
    pub fn new(a: Vertex, b: Vertex) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// The smaller endpoint.
    #[must_use]
    pub const fn first(&self) -> Vertex {
        self.0
    }

    /// The larger endpoint.
    #[must_use]
    pub const fn second(&self) -> Vertex {
        self.1
    }

    /// Whether `v` is an endpoint of this edge.
    #[must_use]
    pub fn is_incident(&self, v: Vertex) -> bool {
        self.0 == v || self.1 == v
    }

    /// Whether the two edges share an endpoint.
    #[must_use]
    pub fn shares_endpoint(&self, other: &Edge) -> bool {
        self.is_incident(other.0) || self.is_incident(other.1)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

// =============================================================================
// EXACT RATIO
// =============================================================================

/// An exact fraction in lowest terms with a positive denominator.
///
/// Used for invariants whose value is rational (average degree, harmonic index)
/// so that no floating point ever enters a knowledge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    numer: i64,
    denom: i64,
}

impl Ratio {
    /// Create a ratio, reducing it to lowest terms.
    ///
    /// A zero denominator is rejected as an invalid parameter.
    pub fn new(numer: i64, denom: i64) -> Result<Self, GraphCalcError> {
        if denom == 0 {
            return Err(GraphCalcError::InvalidParameter {
                name: "denom",
                reason: "ratio denominator must be non-zero".to_string(),
            });
        }
        let sign = if denom < 0 { -1 } else { 1 };
        let g = gcd(numer.unsigned_abs(), denom.unsigned_abs()).max(1) as i64;
        Ok(Self {
            numer: sign * numer / g,
            denom: sign * denom / g,
        })
    }

    /// A whole number as a ratio.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self {
            numer: value,
            denom: 1,
        }
    }

    #[must_use]
    pub const fn numer(&self) -> i64 {
        self.numer
    }

    #[must_use]
    pub const fn denom(&self) -> i64 {
        self.denom
    }

    /// Exact sum of two ratios.
    pub fn checked_add(self, other: Ratio) -> Result<Ratio, GraphCalcError> {
        let overflow = || GraphCalcError::InvalidParameter {
            name: "ratio",
            reason: "ratio arithmetic overflowed".to_string(),
        };
        let numer = self
            .numer
            .checked_mul(other.denom)
            .and_then(|a| other.numer.checked_mul(self.denom).map(|b| (a, b)))
            .and_then(|(a, b)| a.checked_add(b))
            .ok_or_else(overflow)?;
        let denom = self.denom.checked_mul(other.denom).ok_or_else(overflow)?;
        Ratio::new(numer, denom)
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let lhs = i128::from(self.numer) * i128::from(other.denom);
        let rhs = i128::from(other.numer) * i128::from(self.denom);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

// =============================================================================
// PROPERTY VALUE
// =============================================================================

/// A single cell of a knowledge table.
///
/// `Missing` is the padding marker used when list columns are expanded to a
/// fixed width, and the value of partial invariants (diameter of a
/// disconnected graph) where they are undefined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PropertyValue {
    /// An integer invariant.
    Int(i64),
    /// A graph predicate.
    Bool(bool),
    /// An exact rational invariant.
    Ratio(Ratio),
    /// A list-valued property (degree sequence, witness sets).
    List(Vec<PropertyValue>),
    /// Missing-value marker.
    #[default]
    Missing,
}

impl PropertyValue {
    /// Whether this cell is the missing-value marker.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// The integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Build a list cell from integers.
    #[must_use]
    pub fn int_list<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self::List(values.into_iter().map(Self::Int).collect())
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Ratio> for PropertyValue {
    fn from(v: Ratio) -> Self {
        Self::Ratio(v)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Missing, Into::into)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Ratio(v) => write!(f, "{}", v),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Missing => write!(f, "NA"),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur anywhere in graphcalc.
///
/// - No silent failures
/// - Every condition is a distinguishable variant
/// - The engine never retries a failed solve with another backend
#[derive(Debug, Error)]
pub enum GraphCalcError {
    /// The requested vertex is not part of the graph.
    #[error("vertex not found: {0}")]
    VertexNotFound(Vertex),

    /// An edge joining a vertex to itself was supplied.
    #[error("self-loop on vertex {0} is not allowed in a simple graph")]
    SelfLoop(Vertex),

    /// A backend name that no known backend answers to.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// A solver descriptor or option mapping that cannot be interpreted.
    #[error("malformed solver descriptor: {0}")]
    MalformedDescriptor(String),

    /// A backend that was asked for (or the whole detection chain) is not usable.
    #[error("backend '{name}' is unavailable: {reason}")]
    BackendUnavailable { name: String, reason: String },

    /// An invariant parameter outside its domain, caught before model construction.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The model has no feasible solution.
    #[error("model is infeasible")]
    Infeasible,

    /// The backend stopped with an incumbent whose optimality was not proved.
    #[error("best value found is {best} but optimality was not proved")]
    NotProvenOptimal { best: i64 },

    /// The backend hit its limit before finding any feasible solution.
    #[error("limit reached before any feasible solution was found")]
    TimeLimitWithoutSolution,

    /// A backend reported a value too far from any integer.
    #[error("backend reported {reported}, which is not within tolerance of {nearest}")]
    RoundingOutOfTolerance { reported: f64, nearest: i64 },

    /// The backend process or API failed.
    #[error("backend failure: {0}")]
    BackendFailure(String),

    /// A property name resolved neither in the registry nor in petgraph.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A serialization or parsing error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// TESTS
// =============================================================================
