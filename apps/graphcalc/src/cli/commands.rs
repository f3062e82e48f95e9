//! # CLI Command Implementations
//!
//! Each `cmd_*` function prints its result; the `render_*` helpers build the
//! text so it can be checked without capturing stdout.

use crate::config::GraphCalcConfig;
use crate::input::load_graphs;
use graphcalc_core::adapter::PETGRAPH_PROPERTIES;
use graphcalc_core::{
    GraphCalcError, KnowledgeTable, PropertyRegistry, PropertyValue, SolveContext, SolverReport,
    diagnose,
};
use serde::Serialize;
use tracing::info;

fn to_json<T: Serialize>(value: &T) -> Result<String, GraphCalcError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| GraphCalcError::SerializationError(format!("Cannot encode output: {}", e)))
}

// =============================================================================
// SOLVERS COMMAND
// =============================================================================

/// The report, plus what the configured descriptor resolves to.
pub fn render_solvers(
    report: &SolverReport,
    ctx: &SolveContext,
    json_mode: bool,
) -> Result<String, GraphCalcError> {
    let effective = ctx.spec().map(|spec| spec.to_string()).map_err(|e| e.to_string());

    if json_mode {
        let candidates: Vec<_> = report
            .candidates
            .iter()
            .map(|c| match &c.result {
                Ok(location) => serde_json::json!({
                    "name": c.name,
                    "available": true,
                    "location": location.to_string(),
                }),
                Err(reason) => serde_json::json!({
                    "name": c.name,
                    "available": false,
                    "reason": reason,
                }),
            })
            .collect();
        let outcome = |result: &Result<String, String>| match result {
            Ok(selected) => serde_json::json!({ "ok": selected }),
            Err(error) => serde_json::json!({ "error": error }),
        };
        let output = serde_json::json!({
            "preferred": report.preferred,
            "forced_path": report.forced_path.as_ref().map(|p| p.display().to_string()),
            "candidates": candidates,
            "auto_selection": outcome(&report.selection),
            "effective": outcome(&effective),
        });
        return to_json(&output);
    }

    let mut out = report.to_string();
    out.push('\n');
    match effective {
        Ok(selected) => out.push_str(&format!("effective: {}", selected)),
        Err(error) => out.push_str(&format!("effective: error: {}", error)),
    }
    Ok(out)
}

/// Show which backend would be used, and why.
pub fn cmd_solvers(config: &GraphCalcConfig, json_mode: bool) -> Result<(), GraphCalcError> {
    let ctx = config.solve_context();
    let report = diagnose(ctx.environment());
    println!("{}", render_solvers(&report, &ctx, json_mode)?);
    Ok(())
}

// =============================================================================
// INVARIANT COMMAND
// =============================================================================

#[derive(Debug, Serialize)]
struct InvariantOutput<'a> {
    graph: Option<&'a str>,
    property: &'a str,
    value: &'a PropertyValue,
}

/// Evaluate one property on every graph the argument names.
pub fn render_invariant(
    registry: &PropertyRegistry,
    ctx: &SolveContext,
    property: &str,
    graph_arg: &str,
    json_mode: bool,
) -> Result<String, GraphCalcError> {
    registry.check(property)?;
    let graphs = load_graphs(&[graph_arg])?;

    let mut lines = Vec::new();
    let mut outputs = Vec::new();
    let values = graphs
        .iter()
        .map(|graph| registry.evaluate(property, graph, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    for (graph, value) in graphs.iter().zip(&values) {
        let name = graph.name().unwrap_or(graph_arg);
        info!(property, graph = name, %value, "computed");
        lines.push(format!("{}({}) = {}", property, name, value));
        outputs.push(InvariantOutput {
            graph: graph.name(),
            property,
            value,
        });
    }

    if json_mode {
        return match outputs.as_slice() {
            [single] => to_json(single),
            _ => to_json(&outputs),
        };
    }
    Ok(lines.join("\n"))
}

/// Compute one property of one graph.
pub fn cmd_invariant(
    config: &GraphCalcConfig,
    json_mode: bool,
    property: &str,
    graph_arg: &str,
) -> Result<(), GraphCalcError> {
    let registry = PropertyRegistry::standard();
    let ctx = config.solve_context();
    println!("{}", render_invariant(&registry, &ctx, property, graph_arg, json_mode)?);
    Ok(())
}

// =============================================================================
// TABLE COMMAND
// =============================================================================

/// Build, expand and render a knowledge table.
pub fn render_table(
    registry: &PropertyRegistry,
    ctx: &SolveContext,
    graph_args: &[String],
    properties: &[String],
    expand: &[String],
    json_mode: bool,
) -> Result<String, GraphCalcError> {
    let graphs = load_graphs(graph_args)?;
    let mut table = KnowledgeTable::build(&graphs, properties, registry, ctx)?;
    for name in expand {
        table.expand_list_column(name)?;
    }

    let names: Vec<String> = table
        .graph_names()
        .iter()
        .enumerate()
        .map(|(i, name)| name.clone().unwrap_or_else(|| format!("G{}", i)))
        .collect();

    if json_mode {
        let export = table.export();
        let output = serde_json::json!({
            "graphs": names,
            "columns": export.columns,
            "rows": export.rows,
        });
        return to_json(&output);
    }

    let mut out = String::from("graph");
    for column in table.columns() {
        out.push('\t');
        out.push_str(&column);
    }
    for (name, row) in names.iter().zip(table.rows()) {
        out.push('\n');
        out.push_str(name);
        for cell in row {
            out.push('\t');
            out.push_str(&cell.to_string());
        }
    }
    Ok(out)
}

/// Build a knowledge table over several graphs.
pub fn cmd_table(
    config: &GraphCalcConfig,
    json_mode: bool,
    graph_args: &[String],
    properties: &[String],
    expand: &[String],
) -> Result<(), GraphCalcError> {
    let registry = PropertyRegistry::standard();
    let ctx = config.solve_context();
    println!(
        "{}",
        render_table(&registry, &ctx, graph_args, properties, expand, json_mode)?
    );
    Ok(())
}

// =============================================================================
// PROPERTIES COMMAND
// =============================================================================

/// Every registry name with its kind and description, then the petgraph names.
pub fn render_properties(registry: &PropertyRegistry, json_mode: bool) -> Result<String, GraphCalcError> {
    let mut rows: Vec<(String, String, String)> = registry
        .names()
        .filter_map(|name| {
            registry
                .get(name)
                .map(|entry| (name.to_string(), entry.kind.to_string(), entry.description.to_string()))
        })
        .collect();
    rows.extend(
        PETGRAPH_PROPERTIES
            .iter()
            .filter(|name| registry.get(name).is_none())
            .map(|name| (name.to_string(), "petgraph".to_string(), String::new())),
    );

    if json_mode {
        let output: Vec<_> = rows
            .iter()
            .map(|(name, kind, description)| {
                serde_json::json!({ "name": name, "kind": kind, "description": description })
            })
            .collect();
        return to_json(&output);
    }

    Ok(rows
        .iter()
        .map(|(name, kind, description)| format!("{:<42} {:<8} {}", name, kind, description).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// List known property names.
pub fn cmd_properties(json_mode: bool) -> Result<(), GraphCalcError> {
    println!("{}", render_properties(&PropertyRegistry::standard(), json_mode)?);
    Ok(())
}
