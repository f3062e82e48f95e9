//! # graphcalc-core
//!
//! The exact graph-invariant computation engine for graphcalc.
//!
//! Invariants are computed exactly, either by formulating an integer program
//! and handing it to a pluggable MILP backend, by exhaustive subset search,
//! or in closed form from the degree sequence.
//!
//! ## Pipeline
//!
//! ```text
//! Graph ──► formulation ──► IlpModel ──► orchestrator ──► InvariantResult
//!                                            │
//!                          solver resolver ──┘  (bnb | cbc | highs)
//!
//! [Graph] × [property name] ──► registry ──► KnowledgeTable
//! ```
//!
//! ## Architectural Constraints
//!
//! - Synchronous, no async, no network
//! - Deterministic: `BTreeMap`/`BTreeSet` iteration everywhere
//! - Integer models; floating point only at the backend boundary
//! - A solver-backed value is either proved optimal or reported as unproven
//! - Non-solver invariants never resolve a backend

// =============================================================================
// MODULES
// =============================================================================

pub mod adapter;
pub mod formulation;
pub mod generators;
pub mod graph;
pub mod invariants;
pub mod model;
pub mod orchestrator;
pub mod primitives;
pub mod registry;
pub mod solver;
pub mod table;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Edge, GraphCalcError, PropertyValue, Ratio, Vertex};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use graph::{Graph, GraphView, InducedSubgraph, SerializableGraph};
pub use model::{Direction, IlpModel, LinearExpr, Sense, VarId, VarTag, WitnessKind};
pub use orchestrator::{InvariantResult, SolveContext, SolveStatus, Witness, execute};
pub use registry::{PropertyKind, PropertyRegistry};
pub use table::{KnowledgeTable, TableExport};

// =============================================================================
// RE-EXPORTS: Solver
// =============================================================================

pub use solver::{
    BackendClass, MilpBackend, RunOptions, SolverCache, SolverDescriptor, SolverEnvironment,
    SolverOptions, SolverReport, SolverSpec, diagnose, resolve,
};
