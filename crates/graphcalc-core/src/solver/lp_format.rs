//! # CPLEX LP Writer
//!
//! Renders an `IlpModel` in the CPLEX LP text format read by CBC and HiGHS.
//!
//! Column names are `v{index}_{name}` with the model name reduced to
//! `[A-Za-z0-9_]`, so they are unique and valid whatever the formulation
//! called them. `LpFile::column_index` maps them back.

use crate::model::{Direction, IlpModel, LinearExpr, Sense};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Maximum characters per LP line before a term wraps.
const LINE_WIDTH: usize = 200;

/// A rendered model plus the column-name lookup.
#[derive(Debug, Clone)]
pub struct LpFile {
    pub text: String,
    columns: BTreeMap<String, usize>,
}

impl LpFile {
    /// Model variable index for a column name written by `write_lp`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn column_name(index: usize, name: &str) -> String {
    format!("v{}_{}", index, sanitize(name))
}

fn write_expr(out: &mut String, expr: &LinearExpr, names: &[String]) {
    if expr.is_empty() {
        // The format needs at least one term.
        let _ = write!(out, " 0 {}", names.first().map_or("v0", String::as_str));
        return;
    }
    let mut line_len = 0;
    for (i, (var, coefficient)) in expr.terms().enumerate() {
        let sign = if coefficient < 0 { "-" } else { "+" };
        let name = names.get(var.index()).map_or("", String::as_str);
        let term = if i == 0 && coefficient > 0 {
            format!(" {} {}", coefficient, name)
        } else {
            format!(" {} {} {}", sign, coefficient.unsigned_abs(), name)
        };
        if line_len + term.len() > LINE_WIDTH {
            out.push_str("\n ");
            line_len = 0;
        }
        line_len += term.len();
        out.push_str(&term);
    }
}

/// Render `model` as CPLEX LP.
#[must_use]
pub fn write_lp(model: &IlpModel) -> LpFile {
    let names: Vec<String> = model
        .variables()
        .iter()
        .enumerate()
        .map(|(i, v)| column_name(i, &v.name))
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "\\ {}", model.name());
    out.push_str(match model.objective().direction {
        Direction::Minimize => "Minimize\n",
        Direction::Maximize => "Maximize\n",
    });
    out.push_str(" obj:");
    write_expr(&mut out, &model.objective().expr, &names);
    out.push('\n');

    out.push_str("Subject To\n");
    for (i, constraint) in model.constraints().iter().enumerate() {
        let _ = write!(out, " r{}_{}:", i, sanitize(&constraint.name));
        write_expr(&mut out, &constraint.expr, &names);
        let sense = match constraint.sense {
            Sense::LessEq => "<=",
            Sense::GreaterEq => ">=",
            Sense::Equal => "=",
        };
        let _ = writeln!(out, " {} {}", sense, constraint.rhs);
    }

    out.push_str("Bounds\n");
    for (name, var) in names.iter().zip(model.variables()) {
        let _ = writeln!(out, " {} <= {} <= {}", var.lower, name, var.upper);
    }

    let (binaries, generals): (Vec<_>, Vec<_>) = names
        .iter()
        .zip(model.variables())
        .partition(|(_, var)| var.is_binary());
    if !binaries.is_empty() {
        out.push_str("Binaries\n");
        for (name, _) in binaries {
            let _ = writeln!(out, " {}", name);
        }
    }
    if !generals.is_empty() {
        out.push_str("Generals\n");
        for (name, _) in generals {
            let _ = writeln!(out, " {}", name);
        }
    }
    out.push_str("End\n");

    let columns = names.into_iter().enumerate().map(|(i, n)| (n, i)).collect();
    LpFile { text: out, columns }
}
