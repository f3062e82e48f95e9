//! # Solver Layer
//!
//! Backends that solve an `IlpModel`, and the resolver that picks one.
//!
//! - `descriptor`: what the caller asks for (name, class, instance, factory)
//! - `environment`: the environment snapshot consulted during resolution
//! - `resolver`: the precedence chain, the diagnostic report and the cache
//! - `bnb`: the in-process branch-and-bound backend
//! - `cli` / `lp_format`: command-line backends driven through LP files

pub mod bnb;
pub mod cli;
pub mod descriptor;
pub mod environment;
pub mod lp_format;
pub mod resolver;

use crate::GraphCalcError;
use crate::model::IlpModel;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use bnb::BranchAndBound;
pub use cli::CommandLineBackend;
pub use descriptor::{BackendClass, BackendFactory, OptionValue, SolverDescriptor, SolverOptions};
pub use environment::SolverEnvironment;
pub use resolver::{CandidateProbe, SolverCache, SolverReport, SolverSpec, diagnose, resolve};

// =============================================================================
// BACKEND CONTRACT
// =============================================================================

/// Where a backend runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendLocation {
    /// Linked into this process.
    InProcess,
    /// An external executable driven through model and solution files.
    Executable(PathBuf),
}

impl fmt::Display for BackendLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProcess => write!(f, "in-process"),
            Self::Executable(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Termination state reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    /// Search finished with a proved optimum.
    Optimal,
    /// A limit stopped the search after an incumbent was found.
    LimitWithIncumbent,
    /// A limit stopped the search before any feasible point was found.
    LimitWithoutIncumbent,
    /// Search finished without a feasible point.
    Infeasible,
}

/// Raw backend output: status, objective and one value per model variable.
///
/// Values are floating point because external solvers report them that way;
/// the orchestrator rounds them.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSolution {
    pub status: BackendStatus,
    pub objective: Option<f64>,
    pub values: Vec<f64>,
    /// Log lines produced during the solve.
    pub log: Vec<String>,
}

impl BackendSolution {
    /// A solution carrying only a status.
    #[must_use]
    pub fn without_values(status: BackendStatus, log: Vec<String>) -> Self {
        Self {
            status,
            objective: None,
            values: Vec::new(),
            log,
        }
    }
}

/// A MILP backend.
///
/// Implementations must be deterministic for a fixed model and options,
/// apart from which optimal point they return.
pub trait MilpBackend: Send + Sync + fmt::Debug {
    /// Canonical backend name (`bnb`, `cbc`, `highs`, or a custom name).
    fn name(&self) -> &str;

    fn location(&self) -> BackendLocation;

    /// Solve `model` under the per-call run options.
    fn solve(&self, model: &IlpModel, run: &RunOptions)
    -> Result<BackendSolution, GraphCalcError>;
}

// =============================================================================
// RUN OPTIONS
// =============================================================================

/// Receiver for backend log lines.
#[derive(Clone)]
pub struct LogSink(Arc<dyn Fn(&str) + Send + Sync>);

impl LogSink {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A sink that forwards every line to `tracing` at info level.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(|line| tracing::info!(target: "graphcalc::solver", "{}", line))
    }

    pub fn emit(&self, line: &str) {
        (self.0)(line);
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink(..)")
    }
}

/// Per-call execution settings applied to every backend call.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub time_limit: Option<Duration>,
    pub threads: Option<usize>,
    pub verbose: bool,
    pub log_sink: Option<LogSink>,
}

impl RunOptions {
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn log_sink_receives_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let sink = LogSink::new(move |line| {
            captured.lock().expect("lock").push(line.to_string());
        });
        sink.emit("first");
        sink.emit("second");
        assert_eq!(*lines.lock().expect("lock"), vec!["first", "second"]);
    }

    #[test]
    fn location_display() {
        assert_eq!(BackendLocation::InProcess.to_string(), "in-process");
        assert_eq!(
            BackendLocation::Executable(PathBuf::from("/opt/cbc")).to_string(),
            "/opt/cbc"
        );
    }
}
