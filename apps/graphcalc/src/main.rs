//! # graphcalc
//!
//! The command-line front end of the graphcalc invariant engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 apps/graphcalc (THE BINARY)               │
//! │                                                           │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────────┐   │
//! │  │    CLI      │   │   Config    │   │  Graph input   │   │
//! │  │   (clap)    │   │   (toml)    │   │ (json, specs)  │   │
//! │  └──────┬──────┘   └──────┬──────┘   └───────┬────────┘   │
//! │         └─────────────────┼──────────────────┘            │
//! │                           ▼                               │
//! │                  ┌────────────────┐                       │
//! │                  │ graphcalc-core │                       │
//! │                  │  (THE ENGINE)  │                       │
//! │                  └────────────────┘                       │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Which backend would be used, and why
//! graphcalc solvers
//!
//! # One invariant on one graph
//! graphcalc invariant domination_number petersen
//!
//! # A knowledge table
//! graphcalc table cycle:6 path:5 -p order,size,independence_number
//! ```

use clap::Parser;
use graphcalc::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // GRAPHCALC_LOG_FORMAT=json enables machine-parseable logs.
    let log_format = std::env::var("GRAPHCALC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "graphcalc=info,graphcalc_core=info".into());

    // Logs go to stderr so that stdout carries only results.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    eprintln!(
        r#"
  graphcalc v{}
  exact graph invariants
"#,
        env!("CARGO_PKG_VERSION")
    );
}
