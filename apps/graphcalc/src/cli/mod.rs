//! # graphcalc CLI Module
//!
//! ## Available Commands
//!
//! - `solvers` - Report which MILP backend would be used, and why
//! - `invariant` - Compute one property of one graph
//! - `table` - Build a knowledge table over several graphs
//! - `properties` - List every property name the registry knows

mod commands;

use crate::config::{CliOverrides, GraphCalcConfig};
use clap::{Parser, Subcommand};
use graphcalc_core::GraphCalcError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// graphcalc - exact graph invariants
///
/// Solver-backed invariants are proved optimal by a MILP backend; the
/// in-process branch-and-bound is always available.
#[derive(Parser, Debug)]
#[command(name = "graphcalc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (TOML). Defaults to ./graphcalc.toml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend name: bnb, cbc or highs
    #[arg(short, long, global = true)]
    pub solver: Option<String>,

    /// Per-solve time limit in seconds
    #[arg(short = 't', long, global = true)]
    pub time_limit: Option<u64>,

    /// Threads for backends that support them
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Backend option as key=value (repeatable)
    #[arg(short = 'o', long = "option", global = true)]
    pub options: Vec<String>,

    /// Forward backend output to the log
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the backend resolution report
    Solvers,

    /// Compute one property of one graph
    Invariant {
        /// Property name, e.g. domination_number
        property: String,

        /// Graph: a JSON file or a generator spec such as cycle:6
        graph: String,
    },

    /// Build a knowledge table: one row per graph, one column per property
    Table {
        /// Graphs: JSON files or generator specs
        #[arg(required = true)]
        graphs: Vec<String>,

        /// Properties (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        properties: Vec<String>,

        /// List-valued properties to expand into fixed-width columns
        #[arg(short, long, value_delimiter = ',')]
        expand: Vec<String>,
    },

    /// List known property names
    Properties,
}

impl Cli {
    /// The flags that override the config file.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            backend: self.solver.clone(),
            time_limit_secs: self.time_limit,
            threads: self.threads,
            verbose: self.verbose.then_some(true),
            options: self.options.clone(),
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), GraphCalcError> {
    let config = GraphCalcConfig::load(cli.config.as_deref(), Some(&cli.overrides()))?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Solvers) => cmd_solvers(&config, json_mode),
        Some(Commands::Invariant { property, graph }) => {
            cmd_invariant(&config, json_mode, &property, &graph)
        }
        Some(Commands::Table {
            graphs,
            properties,
            expand,
        }) => cmd_table(&config, json_mode, &graphs, &properties, &expand),
        Some(Commands::Properties) => cmd_properties(json_mode),
        None => {
            // No subcommand - show the solver report by default
            cmd_solvers(&config, json_mode)
        }
    }
}
