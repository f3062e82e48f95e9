//! # Property Registry
//!
//! Maps property names to evaluators producing a single table cell.
//!
//! ## Resolution Order
//!
//! 1. Names registered here (`PropertyRegistry::standard()` covers every
//!    invariant and predicate of the crate).
//! 2. The petgraph namespace (`adapter::PETGRAPH_PROPERTIES`).
//! 3. Otherwise `UnknownProperty(name)`.
//!
//! Solver-backed cells hold the proved optimum. An infeasible model becomes
//! `Missing`; an unproven incumbent is an error, never a cell.

use crate::adapter::{PETGRAPH_PROPERTIES, external_property};
use crate::formulation::{basics, degree, forcing};
use crate::graph::{Graph, GraphView};
use crate::invariants;
use crate::orchestrator::{InvariantResult, SolveContext, SolveStatus};
use crate::{GraphCalcError, PropertyValue};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Evaluates one property of one graph.
pub type PropertyFn =
    Arc<dyn Fn(&Graph, &SolveContext) -> Result<PropertyValue, GraphCalcError> + Send + Sync>;

/// How a property is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PropertyKind {
    /// Needs a MILP backend.
    Solver,
    /// Exact subset search.
    Search,
    /// Closed form or a graph traversal.
    Direct,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solver => write!(f, "solver"),
            Self::Search => write!(f, "search"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

#[derive(Clone)]
pub struct PropertyEntry {
    pub kind: PropertyKind,
    pub description: &'static str,
    eval: PropertyFn,
}

impl fmt::Debug for PropertyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyEntry")
            .field("kind", &self.kind)
            .field("description", &self.description)
            .finish()
    }
}

/// The cell for a solver-backed or search result.
fn result_cell(result: InvariantResult) -> Result<PropertyValue, GraphCalcError> {
    match result.status {
        SolveStatus::Infeasible => Ok(PropertyValue::Missing),
        _ => result.optimal_value().map(PropertyValue::Int),
    }
}

/// The witness vertex labels as a list cell.
fn witness_cell(result: InvariantResult) -> PropertyValue {
    match result.witness.vertex_set() {
        Some(set) => PropertyValue::int_list(set.iter().map(|v| v.0 as i64)),
        None => PropertyValue::Missing,
    }
}

fn count(value: usize) -> PropertyValue {
    PropertyValue::Int(value as i64)
}

#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    entries: BTreeMap<String, PropertyEntry>,
}

impl PropertyRegistry {
    /// An empty registry. Only petgraph names resolve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a property.
    pub fn register<F>(&mut self, name: &str, kind: PropertyKind, description: &'static str, eval: F)
    where
        F: Fn(&Graph, &SolveContext) -> Result<PropertyValue, GraphCalcError> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            PropertyEntry {
                kind,
                description,
                eval: Arc::new(eval),
            },
        );
    }

    fn solver<F>(&mut self, name: &str, description: &'static str, f: F)
    where
        F: Fn(&Graph, &SolveContext) -> Result<InvariantResult, GraphCalcError> + Send + Sync + 'static,
    {
        self.register(name, PropertyKind::Solver, description, move |g, ctx| {
            result_cell(f(g, ctx)?)
        });
    }

    fn search<F>(&mut self, name: &str, description: &'static str, f: F)
    where
        F: Fn(&Graph) -> Result<InvariantResult, GraphCalcError> + Send + Sync + 'static,
    {
        self.register(name, PropertyKind::Search, description, move |g, _| {
            result_cell(f(g)?)
        });
    }

    fn direct<F>(&mut self, name: &str, description: &'static str, f: F)
    where
        F: Fn(&Graph) -> Result<PropertyValue, GraphCalcError> + Send + Sync + 'static,
    {
        self.register(name, PropertyKind::Direct, description, move |g, _| f(g));
    }

    /// Every invariant and predicate of the crate under its canonical name.
    #[must_use]
    pub fn standard() -> Self {
        let mut r = Self::new();

        // Packing, covering, partitioning.
        r.solver("independence_number", "size of a maximum independent set", invariants::independence_number);
        r.solver("clique_number", "size of a maximum clique", invariants::clique_number);
        r.solver("matching_number", "size of a maximum matching", invariants::matching_number);
        r.solver("vertex_cover_number", "size of a minimum vertex cover", invariants::vertex_cover_number);
        r.solver("edge_cover_number", "size of a minimum edge cover", invariants::edge_cover_number);
        r.solver("domination_number", "size of a minimum dominating set", invariants::domination_number);
        r.solver("two_domination_number", "size of a minimum 2-dominating set", |g, ctx| {
            invariants::k_domination_number(g, 2, ctx)
        });
        r.solver("total_domination_number", "size of a minimum total dominating set", invariants::total_domination_number);
        r.solver("independent_domination_number", "size of a minimum independent dominating set", invariants::independent_domination_number);
        r.solver("restrained_domination_number", "size of a minimum restrained dominating set", invariants::restrained_domination_number);
        r.solver("roman_domination_number", "weight of a minimum Roman dominating function", invariants::roman_domination_number);
        r.solver("double_roman_domination_number", "weight of a minimum double Roman dominating function", invariants::double_roman_domination_number);
        r.solver("two_rainbow_domination_number", "weight of a minimum 2-rainbow dominating function", |g, ctx| {
            invariants::rainbow_domination_number(g, 2, ctx)
        });
        r.solver("min_maximal_matching_number", "size of a minimum maximal matching", invariants::min_maximal_matching_number);
        r.solver("chromatic_number", "fewest colors in a proper coloring", invariants::chromatic_number);

        // Witness lists.
        r.register("maximum_independent_set", PropertyKind::Solver, "vertices of a maximum independent set", |g, ctx| {
            Ok(witness_cell(invariants::independence_number(g, ctx)?))
        });
        r.register("minimum_dominating_set", PropertyKind::Solver, "vertices of a minimum dominating set", |g, ctx| {
            Ok(witness_cell(invariants::domination_number(g, ctx)?))
        });

        // Propagation.
        r.search("zero_forcing_number", "size of a minimum zero forcing set", forcing::zero_forcing);
        r.search("two_forcing_number", "size of a minimum 2-forcing set", |g| forcing::k_forcing(g, 2));
        r.search("total_zero_forcing_number", "size of a minimum total forcing set", forcing::total_zero_forcing);
        r.search("connected_zero_forcing_number", "size of a minimum connected forcing set", forcing::connected_zero_forcing);
        r.search("positive_semidefinite_zero_forcing_number", "size of a minimum PSD forcing set", forcing::psd_zero_forcing);
        r.search("power_domination_number", "size of a minimum power dominating set", forcing::power_domination);
        r.search("outer_connected_domination_number", "size of a minimum outer-connected dominating set", forcing::outer_connected_domination);

        // Degree sequence.
        r.direct("degree_sequence", "degrees in non-increasing order", |g| {
            Ok(PropertyValue::int_list(g.degree_sequence().into_iter().map(|d| d as i64)))
        });
        r.direct("minimum_degree", "smallest degree", |g| Ok(count(degree::minimum_degree(g))));
        r.direct("maximum_degree", "largest degree", |g| Ok(count(degree::maximum_degree(g))));
        r.direct("average_degree", "mean degree, exact", |g| degree::average_degree(g).map(Into::into));
        r.direct("slater", "Slater number", |g| Ok(count(degree::slater(g))));
        r.direct("sub_two_domination_number", "sub-2-domination number", |g| {
            degree::sub_k_domination_number(g, 2).map(count)
        });
        r.direct("sub_total_domination_number", "sub-total domination number", |g| {
            Ok(degree::sub_total_domination_number(g).map(|t| t as i64).into())
        });
        r.direct("annihilation_number", "annihilation number", |g| Ok(count(degree::annihilation_number(g))));
        r.direct("residue", "Havel-Hakimi residue", |g| Ok(count(degree::residue(g))));
        r.direct("harmonic_index", "harmonic index, exact", |g| degree::harmonic_index(g).map(Into::into));

        // Structure.
        r.direct("order", "number of vertices", |g| Ok(count(basics::order(g))));
        r.direct("size", "number of edges", |g| Ok(count(basics::size(g))));
        r.direct("diameter", "largest eccentricity", |g| {
            Ok(basics::diameter(g)?.map(|d| d as i64).into())
        });
        r.direct("radius", "smallest eccentricity", |g| {
            Ok(basics::radius(g)?.map(|d| d as i64).into())
        });
        r.direct("average_shortest_path_length", "mean distance, exact", |g| {
            Ok(basics::average_shortest_path_length(g)?.into())
        });

        // Predicates.
        let predicates: [(&str, &'static str, fn(&Graph) -> bool); 14] = [
            ("connected", "graph is connected", basics::connected),
            ("bipartite", "graph is two-colorable", basics::bipartite),
            ("tree", "graph is a tree", basics::tree),
            ("regular", "all degrees are equal", basics::regular),
            ("cubic", "graph is 3-regular", basics::cubic),
            ("subcubic", "maximum degree at most 3", basics::subcubic),
            ("eulerian", "graph has an Euler circuit", basics::eulerian),
            ("connected_and_bipartite", "connected and bipartite", basics::connected_and_bipartite),
            ("connected_and_regular", "connected and regular", basics::connected_and_regular),
            ("connected_and_eulerian", "connected and Eulerian", basics::connected_and_eulerian),
            ("connected_and_cubic", "connected and cubic", basics::connected_and_cubic),
            ("connected_and_subcubic", "connected and subcubic", basics::connected_and_subcubic),
            ("chordal", "no induced cycle longer than three", basics::chordal),
            ("connected_and_chordal", "connected and chordal", basics::connected_and_chordal),
        ];
        for (name, description, predicate) in predicates {
            r.direct(name, description, move |g| Ok(PropertyValue::Bool(predicate(g))));
        }

        r
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyEntry> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail with `UnknownProperty` unless `name` resolves somewhere.
    pub fn check(&self, name: &str) -> Result<(), GraphCalcError> {
        if self.entries.contains_key(name) || PETGRAPH_PROPERTIES.contains(&name) {
            Ok(())
        } else {
            Err(GraphCalcError::UnknownProperty(name.to_string()))
        }
    }

    /// Evaluate `name` on `graph`, falling back to the petgraph namespace.
    pub fn evaluate(
        &self,
        name: &str,
        graph: &Graph,
        ctx: &SolveContext,
    ) -> Result<PropertyValue, GraphCalcError> {
        if let Some(entry) = self.entries.get(name) {
            return (entry.eval)(graph, ctx);
        }
        external_property(graph, name).ok_or_else(|| GraphCalcError::UnknownProperty(name.to_string()))
    }
}
