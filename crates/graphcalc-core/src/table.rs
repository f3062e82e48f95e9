//! # Knowledge Table
//!
//! One row per graph, one column per requested property, rows in input order.
//!
//! Cells are stored per property. A list-valued property can be *expanded*
//! into fixed-width columns `name[0]`, `name[1]`, ...; shorter lists are
//! padded with `Missing`. The width is fixed when the column is expanded and
//! only ever grows: appending a row with a longer list widens the column for
//! every row.
//!
//! Unknown property names abort the whole build, since skipping one would
//! misalign the columns.

use crate::graph::Graph;
use crate::orchestrator::SolveContext;
use crate::registry::PropertyRegistry;
use crate::{GraphCalcError, PropertyValue};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Number of expanded cells a value occupies.
fn list_len(value: &PropertyValue) -> usize {
    match value {
        PropertyValue::List(items) => items.len(),
        PropertyValue::Missing => 0,
        _ => 1,
    }
}

/// The `i`-th expanded cell of a value.
fn list_item(value: &PropertyValue, i: usize) -> PropertyValue {
    match value {
        PropertyValue::List(items) => items.get(i).cloned().unwrap_or_default(),
        PropertyValue::Missing => PropertyValue::Missing,
        scalar if i == 0 => scalar.clone(),
        _ => PropertyValue::Missing,
    }
}

/// Columns and rows in export order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableExport {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<PropertyValue>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KnowledgeTable {
    properties: Vec<String>,
    /// Expanded property -> width.
    widths: BTreeMap<String, usize>,
    graph_names: Vec<Option<String>>,
    /// Per row, one raw value per property.
    cells: Vec<Vec<PropertyValue>>,
}

impl KnowledgeTable {
    /// Evaluate every property on every graph.
    ///
    /// All names are checked before anything is computed.
    pub fn build<S: AsRef<str>>(
        graphs: &[Graph],
        properties: &[S],
        registry: &PropertyRegistry,
        ctx: &SolveContext,
    ) -> Result<Self, GraphCalcError> {
        let properties: Vec<String> = properties.iter().map(|p| p.as_ref().to_string()).collect();
        for name in &properties {
            registry.check(name)?;
        }
        info!(graphs = graphs.len(), properties = properties.len(), "building knowledge table");

        let mut table = Self {
            properties,
            ..Self::default()
        };
        for graph in graphs {
            table.push_row(graph, registry, ctx)?;
        }
        Ok(table)
    }

    fn evaluate_row(
        &self,
        graph: &Graph,
        registry: &PropertyRegistry,
        ctx: &SolveContext,
    ) -> Result<Vec<PropertyValue>, GraphCalcError> {
        self.properties
            .iter()
            .map(|name| {
                debug!(property = %name, graph = graph.name().unwrap_or("unnamed"), "evaluating");
                registry.evaluate(name, graph, ctx)
            })
            .collect()
    }

    fn push_row(
        &mut self,
        graph: &Graph,
        registry: &PropertyRegistry,
        ctx: &SolveContext,
    ) -> Result<(), GraphCalcError> {
        let row = self.evaluate_row(graph, registry, ctx)?;
        for (name, value) in self.properties.iter().zip(&row) {
            if let Some(width) = self.widths.get_mut(name) {
                *width = (*width).max(list_len(value));
            }
        }
        self.graph_names.push(graph.name().map(str::to_string));
        self.cells.push(row);
        Ok(())
    }

    /// Compute one more row. Existing rows are not recomputed.
    ///
    /// On error the table is unchanged.
    pub fn append(
        &mut self,
        graph: &Graph,
        registry: &PropertyRegistry,
        ctx: &SolveContext,
    ) -> Result<(), GraphCalcError> {
        self.push_row(graph, registry, ctx)
    }

    /// Replace the column `name` by `name[0]`, `name[1]`, ... wide enough for
    /// the longest list. Scalars count as one-element lists.
    pub fn expand_list_column(&mut self, name: &str) -> Result<(), GraphCalcError> {
        let index = self
            .properties
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| GraphCalcError::UnknownProperty(name.to_string()))?;
        let width = self.cells.iter().map(|row| list_len(&row[index])).max().unwrap_or(0);
        let entry = self.widths.entry(name.to_string()).or_insert(0);
        *entry = (*entry).max(width);
        debug!(column = name, width = *entry, "expanded list column");
        Ok(())
    }

    /// Properties as requested, before expansion.
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Width of an expanded column.
    pub fn expansion_width(&self, name: &str) -> Option<usize> {
        self.widths.get(name).copied()
    }

    /// Column headers in order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for name in &self.properties {
            match self.widths.get(name) {
                Some(&width) => columns.extend((0..width).map(|i| format!("{}[{}]", name, i))),
                None => columns.push(name.clone()),
            }
        }
        columns
    }

    /// Row `i` laid out as `columns()`.
    pub fn row(&self, i: usize) -> Option<Vec<PropertyValue>> {
        let raw = self.cells.get(i)?;
        let mut row = Vec::new();
        for (name, value) in self.properties.iter().zip(raw) {
            match self.widths.get(name) {
                Some(&width) => row.extend((0..width).map(|j| list_item(value, j))),
                None => row.push(value.clone()),
            }
        }
        Some(row)
    }

    pub fn rows(&self) -> Vec<Vec<PropertyValue>> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }

    /// Display names of the graphs, one per row.
    pub fn graph_names(&self) -> &[Option<String>] {
        &self.graph_names
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// One column-name -> cell map per row.
    pub fn records(&self) -> Vec<BTreeMap<String, PropertyValue>> {
        let columns = self.columns();
        self.rows()
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }

    pub fn export(&self) -> TableExport {
        TableExport {
            columns: self.columns(),
            rows: self.rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{cycle_graph, path_graph, star_graph};
    use crate::registry::PropertyKind;

    fn int(v: i64) -> PropertyValue {
        PropertyValue::Int(v)
    }

    #[test]
    fn rows_follow_input_order() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let table = KnowledgeTable::build(
            &[cycle_graph(6), path_graph(5)],
            &["order", "size", "independence_number"],
            &registry,
            &ctx,
        )
        .expect("table");
        assert_eq!(table.columns(), vec!["order", "size", "independence_number"]);
        assert_eq!(table.rows(), vec![vec![int(6), int(6), int(3)], vec![int(5), int(4), int(2)]]);
        assert_eq!(table.graph_names(), &[Some("C6".to_string()), Some("P5".to_string())]);
    }

    #[test]
    fn unknown_property_aborts_before_solving() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let result = KnowledgeTable::build(
            &[cycle_graph(6)],
            &["independence_number", "bogus"],
            &registry,
            &ctx,
        );
        assert!(matches!(result, Err(GraphCalcError::UnknownProperty(name)) if name == "bogus"));
        assert!(!ctx.is_resolved());
    }

    #[test]
    fn expansion_pads_with_missing() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let mut table = KnowledgeTable::build(
            &[path_graph(3), path_graph(2)],
            &["order", "degree_sequence"],
            &registry,
            &ctx,
        )
        .expect("table");
        table.expand_list_column("degree_sequence").expect("expand");
        assert_eq!(
            table.columns(),
            vec!["order", "degree_sequence[0]", "degree_sequence[1]", "degree_sequence[2]"]
        );
        assert_eq!(
            table.rows(),
            vec![
                vec![int(3), int(2), int(1), int(1)],
                vec![int(2), int(1), int(1), PropertyValue::Missing],
            ]
        );
    }

    #[test]
    fn scalars_expand_to_one_cell() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let mut table =
            KnowledgeTable::build(&[cycle_graph(4)], &["order"], &registry, &ctx).expect("table");
        table.expand_list_column("order").expect("expand");
        assert_eq!(table.columns(), vec!["order[0]"]);
        assert!(table.expand_list_column("size").is_err());
    }

    #[test]
    fn append_widens_expanded_columns() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let mut table = KnowledgeTable::build(
            &[path_graph(2)],
            &["degree_sequence", "order"],
            &registry,
            &ctx,
        )
        .expect("table");
        table.expand_list_column("degree_sequence").expect("expand");
        let before = table.rows();
        assert_eq!(table.expansion_width("degree_sequence"), Some(2));

        table.append(&star_graph(3), &registry, &ctx).expect("append");
        assert_eq!(table.expansion_width("degree_sequence"), Some(4));
        assert_eq!(table.len(), 2);
        let after = table.rows();
        assert_eq!(&after[0][..2], &before[0][..2]);
        assert_eq!(after[0][2], PropertyValue::Missing);
        assert_eq!(after[0][3], PropertyValue::Missing);
        assert_eq!(after[0][4], before[0][2]);
        assert_eq!(after[1], vec![int(3), int(1), int(1), int(1), int(4)]);
    }

    #[test]
    fn failed_append_leaves_table_unchanged() {
        let mut registry = PropertyRegistry::new();
        registry.register("fails_on_stars", PropertyKind::Direct, "test property", |g, _| {
            match g.name() {
                Some(name) if name.starts_with("star") => {
                    Err(GraphCalcError::InvalidParameter { name: "graph", reason: "star".to_string() })
                }
                _ => Ok(PropertyValue::Bool(true)),
            }
        });
        let ctx = SolveContext::new();
        let mut table =
            KnowledgeTable::build(&[cycle_graph(3)], &["fails_on_stars"], &registry, &ctx).expect("table");
        let snapshot = table.clone();
        assert!(table.append(&star_graph(3), &registry, &ctx).is_err());
        assert_eq!(table, snapshot);
    }

    #[test]
    fn records_and_export() {
        let registry = PropertyRegistry::standard();
        let ctx = SolveContext::new();
        let table =
            KnowledgeTable::build(&[cycle_graph(5)], &["order", "bipartite"], &registry, &ctx).expect("table");
        let records = table.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["order"], int(5));
        assert_eq!(records[0]["bipartite"], PropertyValue::Bool(false));
        assert_eq!(table.export().columns, vec!["order", "bipartite"]);
    }
}
