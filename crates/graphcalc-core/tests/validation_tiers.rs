//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Graph Model
//! - T1: Solver Resolution
//! - T2: Invariant Values
//! - T3: Knowledge Tables

use graphcalc_core::generators::{
    complete_graph, cycle_graph, path_graph, petersen_graph, star_graph,
};
use graphcalc_core::invariants::{
    chromatic_number, clique_number, domination_number, independence_number, matching_number,
    vertex_cover_number,
};
use graphcalc_core::{
    Graph, GraphCalcError, GraphView, KnowledgeTable, PropertyRegistry, PropertyValue,
    SolveContext, Vertex,
};

fn optimal(result: Result<graphcalc_core::InvariantResult, GraphCalcError>) -> i64 {
    result.expect("solve").optimal_value().expect("optimal")
}

// =============================================================================
// TIER T0: GRAPH MODEL
// =============================================================================

mod t0_graph_model {
    use super::*;

    /// T0.1: Neighbors of a missing vertex is an error, not an empty list.
    #[test]
    fn missing_vertex_rejected() {
        let graph = path_graph(3);
        assert!(matches!(
            graph.neighbors(Vertex(7)),
            Err(GraphCalcError::VertexNotFound(Vertex(7)))
        ));
        assert!(graph.degree(Vertex(7)).is_err());
    }

    /// T0.2: Self-loops are rejected at construction.
    #[test]
    fn self_loop_rejected() {
        let result = Graph::from_edges([(0, 1), (2, 2)]);
        assert!(matches!(result, Err(GraphCalcError::SelfLoop(Vertex(2)))));
    }

    /// T0.3: Degree sequence is non-increasing.
    #[test]
    fn degree_sequence_descending() {
        assert_eq!(star_graph(3).degree_sequence(), vec![3, 1, 1, 1]);
    }

    /// T0.4: A petgraph graph and its native equivalent give the same invariants.
    #[test]
    fn petgraph_input_is_equivalent() {
        let mut pg = petgraph::graph::UnGraph::<(), ()>::new_undirected();
        let nodes: Vec<_> = (0..6).map(|_| pg.add_node(())).collect();
        for i in 0..6 {
            pg.add_edge(nodes[i], nodes[(i + 1) % 6], ());
        }
        let converted = Graph::from(&pg);
        let native = cycle_graph(6);
        assert_eq!(GraphView::edges(&converted), GraphView::edges(&native));

        let ctx = SolveContext::new();
        assert_eq!(
            optimal(independence_number(&converted, &ctx)),
            optimal(independence_number(&native, &ctx))
        );
    }

    /// T0.5: Induced subgraphs answer connectivity for vertex subsets.
    #[test]
    fn induced_subgraph_connectivity() {
        let graph = cycle_graph(6);
        assert!(graph.induced_subgraph([0, 1, 2].map(Vertex)).is_connected());
        assert!(!graph.induced_subgraph([0, 3].map(Vertex)).is_connected());
    }
}

// =============================================================================
// TIER T1: SOLVER RESOLUTION
// =============================================================================

mod t1_solver_resolution {
    use super::*;
    use graphcalc_core::solver::{BackendLocation, BranchAndBound};
    use graphcalc_core::{
        MilpBackend, SolverDescriptor, SolverEnvironment, SolverOptions, diagnose, resolve,
    };
    use std::sync::Arc;

    /// T1.1: An empty environment auto-detects the in-process backend.
    #[test]
    fn auto_detection_picks_in_process() {
        let spec = resolve(
            &SolverDescriptor::Absent,
            &SolverOptions::new(),
            &SolverEnvironment::new(),
        )
        .expect("resolve");
        assert_eq!(spec.name(), "bnb");
        assert_eq!(spec.location(), &BackendLocation::InProcess);
    }

    /// T1.2: A named backend that is not installed is never silently replaced.
    #[test]
    fn named_unavailable_backend_fails() {
        let result = resolve(
            &SolverDescriptor::name("cbc"),
            &SolverOptions::new(),
            &SolverEnvironment::new(),
        );
        assert!(matches!(
            result,
            Err(GraphCalcError::BackendUnavailable { ref name, .. }) if name == "cbc"
        ));
    }

    /// T1.3: Unknown names are configuration errors at resolution time.
    #[test]
    fn unknown_name_fails_at_resolution() {
        let result = resolve(
            &SolverDescriptor::name("gurobi-but-misspelled"),
            &SolverOptions::new(),
            &SolverEnvironment::new(),
        );
        assert!(matches!(result, Err(GraphCalcError::UnknownBackend(_))));
    }

    /// T1.4: The forced backend name outranks auto-detection.
    #[test]
    fn forced_name_outranks_detection() {
        let env = SolverEnvironment::new().with_preferred("highs");
        let result = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), &env);
        assert!(matches!(result, Err(GraphCalcError::BackendUnavailable { .. })));
    }

    /// T1.5: An explicit descriptor outranks the environment.
    #[test]
    fn explicit_descriptor_outranks_environment() {
        let env = SolverEnvironment::new().with_preferred("highs");
        let spec = resolve(&SolverDescriptor::name("bnb"), &SolverOptions::new(), &env)
            .expect("resolve");
        assert_eq!(spec.name(), "bnb");
    }

    /// T1.6: Instances are used as-is and their options ignored.
    #[test]
    fn instance_used_as_is() {
        let backend: Arc<dyn MilpBackend> = Arc::new(BranchAndBound::new().with_node_limit(5));
        let options = SolverOptions::new().with("node_limit", 100_i64);
        let spec = resolve(
            &SolverDescriptor::Instance(Arc::clone(&backend)),
            &options,
            &SolverEnvironment::new(),
        )
        .expect("resolve");
        assert!(Arc::ptr_eq(spec.backend(), &backend));
        assert!(spec.options().is_empty());
    }

    /// T1.7: Resolving twice yields the same backend identity.
    #[test]
    fn resolution_is_idempotent() {
        let env = SolverEnvironment::new();
        let a = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), &env).expect("first");
        let b = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), &env).expect("second");
        assert_eq!(a.name(), b.name());
        assert_eq!(a.location(), b.location());
    }

    /// T1.8: The diagnostic report lists every candidate and the selection.
    #[test]
    fn diagnose_reports_candidates() {
        let report = diagnose(&SolverEnvironment::new());
        let names: Vec<&str> = report.candidates.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["bnb", "cbc", "highs"]);
        let text = report.to_string();
        assert!(text.contains("bnb    available (in-process)"));
        assert!(text.contains("selected: bnb (in-process)"));
    }

    /// T1.9: Non-solver invariants never resolve a backend.
    #[test]
    fn search_invariants_skip_resolution() {
        let ctx = SolveContext::new().with_environment(SolverEnvironment::new().with_preferred("cbc"));
        let registry = PropertyRegistry::standard();
        let value = registry
            .evaluate("zero_forcing_number", &path_graph(4), &ctx)
            .expect("value");
        assert_eq!(value, PropertyValue::Int(1));
        assert!(!ctx.is_resolved());
    }
}

// =============================================================================
// TIER T2: INVARIANT VALUES
// =============================================================================

mod t2_invariant_values {
    use super::*;
    use graphcalc_core::formulation::basics::connected;

    /// T2.1: The 6-cycle.
    #[test]
    fn six_cycle() {
        let ctx = SolveContext::new();
        let graph = cycle_graph(6);
        assert_eq!(optimal(independence_number(&graph, &ctx)), 3);
        assert_eq!(optimal(domination_number(&graph, &ctx)), 2);
        assert_eq!(optimal(chromatic_number(&graph, &ctx)), 2);
    }

    /// T2.2: The 5-cycle.
    #[test]
    fn five_cycle() {
        let ctx = SolveContext::new();
        let graph = cycle_graph(5);
        assert_eq!(optimal(independence_number(&graph, &ctx)), 2);
        assert_eq!(optimal(chromatic_number(&graph, &ctx)), 3);
        assert_eq!(optimal(domination_number(&graph, &ctx)), 2);
    }

    /// T2.3: The Petersen graph.
    #[test]
    fn petersen() {
        let ctx = SolveContext::new();
        let graph = petersen_graph();
        assert_eq!(optimal(independence_number(&graph, &ctx)), 4);
        assert_eq!(optimal(chromatic_number(&graph, &ctx)), 3);
        assert!(connected(&graph));
    }

    /// T2.4: The complete graph on four vertices.
    #[test]
    fn complete_four() {
        let ctx = SolveContext::new();
        let graph = complete_graph(4);
        assert_eq!(optimal(clique_number(&graph, &ctx)), 4);
        assert_eq!(optimal(chromatic_number(&graph, &ctx)), 4);
        assert_eq!(optimal(vertex_cover_number(&graph, &ctx)), 3);
    }

    /// T2.5: The path on six vertices.
    #[test]
    fn path_six() {
        let ctx = SolveContext::new();
        let graph = path_graph(6);
        assert_eq!(optimal(matching_number(&graph, &ctx)), 3);
        assert_eq!(optimal(independence_number(&graph, &ctx)), 3);
    }

    /// T2.6: Invalid parameters are model errors, not infeasibility.
    #[test]
    fn invalid_parameter_is_distinct() {
        let ctx = SolveContext::new();
        let result = graphcalc_core::invariants::k_domination_number(&cycle_graph(6), 0, &ctx);
        assert!(matches!(result, Err(GraphCalcError::InvalidParameter { .. })));
    }
}

// =============================================================================
// TIER T3: KNOWLEDGE TABLES
// =============================================================================

mod t3_knowledge_tables {
    use super::*;

    /// T3.1: Rows align with input graphs.
    #[test]
    fn table_rows_in_input_order() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let table = KnowledgeTable::build(
            &[cycle_graph(6), path_graph(5)],
            &["order", "size", "independence_number"],
            &registry,
            &ctx,
        )
        .expect("table");
        let int = PropertyValue::Int;
        assert_eq!(
            table.rows(),
            vec![vec![int(6), int(6), int(3)], vec![int(5), int(4), int(2)]]
        );
    }

    /// T3.2: An unknown property aborts the batch.
    #[test]
    fn unknown_property_aborts() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let result = KnowledgeTable::build(&[cycle_graph(6)], &["order", "nope"], &registry, &ctx);
        assert!(matches!(result, Err(GraphCalcError::UnknownProperty(name)) if name == "nope"));
    }

    /// T3.3: Appending keeps the first N rows.
    #[test]
    fn append_preserves_rows() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let mut table = KnowledgeTable::build(
            &[cycle_graph(6), path_graph(5)],
            &["order", "domination_number"],
            &registry,
            &ctx,
        )
        .expect("table");
        let before = table.rows();
        table.append(&petersen_graph(), &registry, &ctx).expect("append");
        let after = table.rows();
        assert_eq!(after.len(), 3);
        assert_eq!(&after[..2], &before[..]);
        assert_eq!(after[2], vec![PropertyValue::Int(10), PropertyValue::Int(3)]);
    }
}
