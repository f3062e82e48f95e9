//! # Configuration
//!
//! Layered settings for the solver-backed commands.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied via `apply_cli_overrides`)
//! 2. Config file (`--config <path>`, else `graphcalc.toml` in the working directory)
//! 3. Compiled defaults
//!
//! The process environment (`GRAPHCALC_SOLVER`, `GRAPHCALC_SOLVER_PATH`,
//! `PATH`) is not a layer here. It reaches the resolver as the environment
//! snapshot, where an explicit backend from this config already outranks it.
//!
//! ```toml
//! [solver]
//! backend = "highs"
//! executable = "/opt/highs/bin/highs"
//! time_limit_secs = 60
//! threads = 4
//! verbose = false
//!
//! [solver.options]
//! mip_rel_gap = 0
//! ```

use graphcalc_core::solver::{BackendClass, LogSink, OptionValue};
use graphcalc_core::{
    GraphCalcError, RunOptions, SolveContext, SolverDescriptor, SolverEnvironment, SolverOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "graphcalc.toml";

// =============================================================================
// CONFIG STRUCTURE
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GraphCalcConfig {
    pub solver: SolverConfig,
}

/// The `[solver]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SolverConfig {
    /// Backend name or alias (`bnb`, `cbc`, `highs`).
    pub backend: Option<String>,
    /// Executable for a command-line backend. Ignored when
    /// `GRAPHCALC_SOLVER_PATH` is set.
    pub executable: Option<PathBuf>,
    pub time_limit_secs: Option<u64>,
    pub threads: Option<usize>,
    /// Forward backend log lines to the log.
    pub verbose: Option<bool>,
    /// Backend-specific options, passed through to the resolver.
    pub options: SolverOptions,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend: Option<String>,
    pub time_limit_secs: Option<u64>,
    pub threads: Option<usize>,
    pub verbose: Option<bool>,
    /// `key=value` pairs layered over `[solver.options]`.
    pub options: Vec<String>,
}

// =============================================================================
// LOADING
// =============================================================================

impl GraphCalcConfig {
    /// Load the file layer, apply CLI overrides, then validate.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>, cli_overrides: Option<&CliOverrides>) -> Result<Self, GraphCalcError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    debug!("no config file, using defaults");
                    Self::default()
                }
            }
        };

        if let Some(cli) = cli_overrides {
            config.apply_cli_overrides(cli)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, GraphCalcError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphCalcError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            GraphCalcError::SerializationError(format!("Invalid config '{}': {}", path.display(), e))
        })?;
        info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, GraphCalcError> {
        toml::from_str(toml_str)
            .map_err(|e| GraphCalcError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Write CLI flags over the file values. Only flags that were given apply.
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) -> Result<(), GraphCalcError> {
        if cli.backend.is_some() {
            self.solver.backend = cli.backend.clone();
        }
        if cli.time_limit_secs.is_some() {
            self.solver.time_limit_secs = cli.time_limit_secs;
        }
        if cli.threads.is_some() {
            self.solver.threads = cli.threads;
        }
        if cli.verbose.is_some() {
            self.solver.verbose = cli.verbose;
        }
        for pair in &cli.options {
            let (key, value) = parse_option(pair)?;
            self.solver.options.insert(key, value);
        }
        Ok(())
    }

    /// Reject values no backend could accept.
    ///
    /// Backend availability is not checked here; that is the resolver's job.
    pub fn validate(&self) -> Result<(), GraphCalcError> {
        if let Some(name) = &self.solver.backend {
            BackendClass::from_name(name)?;
        }
        if self.solver.time_limit_secs == Some(0) {
            return Err(GraphCalcError::InvalidParameter {
                name: "solver.time_limit_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.solver.threads == Some(0) {
            return Err(GraphCalcError::InvalidParameter {
                name: "solver.threads",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Split `key=value`; the value is an integer, a boolean, or text.
fn parse_option(pair: &str) -> Result<(String, OptionValue), GraphCalcError> {
    let (key, raw) = pair.split_once('=').ok_or_else(|| {
        GraphCalcError::MalformedDescriptor(format!("option '{}' is not of the form key=value", pair))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(GraphCalcError::MalformedDescriptor(format!(
            "option '{}' has an empty key",
            pair
        )));
    }
    let raw = raw.trim();
    let value = if let Ok(v) = raw.parse::<i64>() {
        OptionValue::Int(v)
    } else if let Ok(v) = raw.parse::<bool>() {
        OptionValue::Bool(v)
    } else {
        OptionValue::Text(raw.to_string())
    };
    Ok((key.to_string(), value))
}

// =============================================================================
// SOLVE CONTEXT
// =============================================================================

impl GraphCalcConfig {
    pub fn descriptor(&self) -> SolverDescriptor {
        self.solver
            .backend
            .as_ref()
            .map_or(SolverDescriptor::Absent, SolverDescriptor::name)
    }

    /// `base` with the configured executable filled in where the environment
    /// forces none.
    pub fn environment_over(&self, base: SolverEnvironment) -> SolverEnvironment {
        match (&self.solver.executable, base.forced_path()) {
            (Some(path), None) => base.with_forced_path(path.clone()),
            _ => base,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        let mut run = RunOptions::default();
        if let Some(secs) = self.solver.time_limit_secs {
            run = run.with_time_limit(Duration::from_secs(secs));
        }
        if let Some(threads) = self.solver.threads {
            run = run.with_threads(threads);
        }
        if self.solver.verbose.unwrap_or(false) {
            run = run.with_verbose(true).with_log_sink(LogSink::tracing());
        }
        run
    }

    /// A context over an explicit environment snapshot.
    pub fn solve_context_with(&self, base: SolverEnvironment) -> SolveContext {
        SolveContext::new()
            .with_descriptor(self.descriptor())
            .with_options(self.solver.options.clone())
            .with_environment(self.environment_over(base))
            .with_run_options(self.run_options())
    }

    /// A context over the captured process environment.
    pub fn solve_context(&self) -> SolveContext {
        self.solve_context_with(SolverEnvironment::capture())
    }
}
