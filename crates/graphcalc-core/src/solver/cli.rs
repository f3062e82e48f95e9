//! # Command-Line Backends
//!
//! Drives the `cbc` and `highs` executables: the model is written as an LP
//! file into a scratch directory, the solver is run with the per-call limits,
//! and its solution file is parsed back into one value per model variable.
//! Variables the solution file does not mention are zero.

use super::descriptor::{BackendClass, SolverOptions};
use super::lp_format::{LpFile, write_lp};
use super::{BackendLocation, BackendSolution, BackendStatus, MilpBackend, RunOptions};
use crate::GraphCalcError;
use crate::model::IlpModel;
use std::path::{Path, PathBuf};
use std::process::Command;

const MODEL_FILE: &str = "model.lp";
const SOLUTION_FILE: &str = "solution.txt";
const HIGHS_OPTIONS_FILE: &str = "highs.opt";

/// A CBC or HiGHS executable plus pass-through options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLineBackend {
    class: BackendClass,
    executable: PathBuf,
    options: SolverOptions,
}

impl CommandLineBackend {
    /// Create a backend for `class` running `executable`.
    ///
    /// Fails with `UnknownBackend` for classes that are not command-line solvers.
    pub fn new(
        class: BackendClass,
        executable: impl Into<PathBuf>,
        options: SolverOptions,
    ) -> Result<Self, GraphCalcError> {
        if class.executable_name().is_none() {
            return Err(GraphCalcError::UnknownBackend(format!(
                "{} is not a command-line backend",
                class
            )));
        }
        Ok(Self {
            class,
            executable: executable.into(),
            options,
        })
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn cbc_arguments(&self, dir: &Path, run: &RunOptions) -> Vec<String> {
        let mut args = vec![dir.join(MODEL_FILE).display().to_string()];
        if let Some(limit) = run.time_limit {
            args.extend(["-sec".to_string(), limit.as_secs_f64().to_string()]);
            args.extend(["-timeMode".to_string(), "elapsed".to_string()]);
        }
        if let Some(threads) = run.threads {
            args.extend(["-threads".to_string(), threads.to_string()]);
        }
        for (key, value) in self.options.iter() {
            args.extend([format!("-{}", key), value.to_string()]);
        }
        args.extend([
            "-branch".to_string(),
            "-solution".to_string(),
            dir.join(SOLUTION_FILE).display().to_string(),
        ]);
        args
    }

    fn highs_arguments(&self, dir: &Path, run: &RunOptions) -> Result<Vec<String>, GraphCalcError> {
        // Threads, the exact gap and pass-through options go in an options file.
        let mut lines = vec!["mip_rel_gap = 0".to_string()];
        if let Some(threads) = run.threads {
            lines.push(format!("threads = {}", threads));
        }
        for (key, value) in self.options.iter() {
            lines.push(format!("{} = {}", key, value));
        }
        let options_path = dir.join(HIGHS_OPTIONS_FILE);
        std::fs::write(&options_path, lines.join("\n") + "\n")
            .map_err(|e| GraphCalcError::IoError(e.to_string()))?;

        let mut args = vec![
            "--model_file".to_string(),
            dir.join(MODEL_FILE).display().to_string(),
            "--solution_file".to_string(),
            dir.join(SOLUTION_FILE).display().to_string(),
            "--options_file".to_string(),
            options_path.display().to_string(),
        ];
        if let Some(limit) = run.time_limit {
            args.extend(["--time_limit".to_string(), limit.as_secs_f64().to_string()]);
        }
        Ok(args)
    }
}

impl MilpBackend for CommandLineBackend {
    fn name(&self) -> &str {
        self.class.name()
    }

    fn location(&self) -> BackendLocation {
        BackendLocation::Executable(self.executable.clone())
    }

    fn solve(
        &self,
        model: &IlpModel,
        run: &RunOptions,
    ) -> Result<BackendSolution, GraphCalcError> {
        let dir = tempfile::tempdir().map_err(|e| GraphCalcError::IoError(e.to_string()))?;
        let lp = write_lp(model);
        std::fs::write(dir.path().join(MODEL_FILE), &lp.text)
            .map_err(|e| GraphCalcError::IoError(e.to_string()))?;

        let args = match self.class {
            BackendClass::Highs => self.highs_arguments(dir.path(), run)?,
            _ => self.cbc_arguments(dir.path(), run),
        };
        tracing::debug!(executable = %self.executable.display(), ?args, "running solver");

        let output = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|e| {
                GraphCalcError::BackendFailure(format!(
                    "failed to start {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        let mut log: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        log.extend(
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string),
        );

        if !output.status.success() {
            let tail = log.iter().rev().take(5).rev().cloned().collect::<Vec<_>>();
            return Err(GraphCalcError::BackendFailure(format!(
                "{} exited with {}: {}",
                self.class,
                output.status,
                tail.join(" | ")
            )));
        }

        let text = std::fs::read_to_string(dir.path().join(SOLUTION_FILE)).map_err(|e| {
            GraphCalcError::BackendFailure(format!("{} wrote no solution file: {}", self.class, e))
        })?;

        let mut solution = match self.class {
            BackendClass::Highs => parse_highs_solution(&text, &lp)?,
            _ => parse_cbc_solution(&text, &lp)?,
        };
        solution.log = log;
        if solution.values.is_empty() {
            return Ok(solution);
        }
        solution.values.resize(model.num_variables(), 0.0);
        Ok(solution)
    }
}

// =============================================================================
// SOLUTION PARSERS
// =============================================================================

fn parse_value(token: &str) -> Result<f64, GraphCalcError> {
    token
        .parse::<f64>()
        .map_err(|_| GraphCalcError::BackendFailure(format!("unparsable value '{}'", token)))
}

/// Parse a CBC `-solution` file.
///
/// The first line carries the status and objective; each further line is
/// `[**] index name value reduced_cost`, listing nonzero columns only.
pub fn parse_cbc_solution(text: &str, lp: &LpFile) -> Result<BackendSolution, GraphCalcError> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| GraphCalcError::BackendFailure("empty cbc solution file".to_string()))?
        .trim();
    let lowered = header.to_ascii_lowercase();

    let status = if lowered.starts_with("optimal") {
        BackendStatus::Optimal
    } else if lowered.starts_with("stopped") {
        if lowered.contains("no integer solution") {
            BackendStatus::LimitWithoutIncumbent
        } else {
            BackendStatus::LimitWithIncumbent
        }
    } else if lowered.contains("infeasible") {
        BackendStatus::Infeasible
    } else {
        return Err(GraphCalcError::BackendFailure(format!(
            "unrecognized cbc status '{}'",
            header
        )));
    };

    if !matches!(
        status,
        BackendStatus::Optimal | BackendStatus::LimitWithIncumbent
    ) {
        return Ok(BackendSolution::without_values(status, Vec::new()));
    }

    let objective = header
        .rsplit("objective value")
        .next()
        .filter(|_| lowered.contains("objective value"))
        .map(|v| parse_value(v.trim()))
        .transpose()?;

    let mut values = vec![0.0; lp.num_columns()];
    for line in lines {
        let tokens: Vec<&str> = line
            .split_whitespace()
            .filter(|t| *t != "**")
            .collect();
        if tokens.len() < 3 {
            continue;
        }
        let Some(index) = lp.column_index(tokens[1]) else {
            continue;
        };
        values[index] = parse_value(tokens[2])?;
    }

    Ok(BackendSolution {
        status,
        objective,
        values,
        log: Vec::new(),
    })
}

/// Parse a HiGHS `--solution_file`.
///
/// Reads the line after `Model status`, the primal feasibility marker, the
/// `Objective` line and the `# Columns N` block of `name value` lines.
pub fn parse_highs_solution(text: &str, lp: &LpFile) -> Result<BackendSolution, GraphCalcError> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let following = |marker: &str| -> Option<usize> {
        lines.iter().position(|l| l.starts_with(marker)).map(|i| i + 1)
    };

    let model_status = following("Model status")
        .and_then(|i| lines.get(i))
        .copied()
        .ok_or_else(|| GraphCalcError::BackendFailure("highs solution has no model status".to_string()))?;
    let primal_feasible = following("# Primal solution values")
        .and_then(|i| lines.get(i))
        .is_some_and(|l| l.eq_ignore_ascii_case("feasible"));

    let lowered = model_status.to_ascii_lowercase();
    let status = if lowered == "optimal" {
        BackendStatus::Optimal
    } else if lowered.contains("infeasible") {
        BackendStatus::Infeasible
    } else if lowered.contains("limit") || lowered.contains("interrupt") {
        if primal_feasible {
            BackendStatus::LimitWithIncumbent
        } else {
            BackendStatus::LimitWithoutIncumbent
        }
    } else {
        return Err(GraphCalcError::BackendFailure(format!(
            "unrecognized highs model status '{}'",
            model_status
        )));
    };

    if !primal_feasible
        || !matches!(
            status,
            BackendStatus::Optimal | BackendStatus::LimitWithIncumbent
        )
    {
        return Ok(BackendSolution::without_values(status, Vec::new()));
    }

    let objective = lines
        .iter()
        .find_map(|l| l.strip_prefix("Objective"))
        .map(|v| parse_value(v.trim()))
        .transpose()?;

    let mut values = vec![0.0; lp.num_columns()];
    if let Some(start) = following("# Columns") {
        for line in lines.iter().skip(start) {
            if line.is_empty() || line.starts_with('#') {
                break;
            }
            let mut tokens = line.split_whitespace();
            let (Some(name), Some(value)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            if let Some(index) = lp.column_index(name) {
                values[index] = parse_value(value)?;
            }
        }
    }

    Ok(BackendSolution {
        status,
        objective,
        values,
        log: Vec::new(),
    })
}
