//! # graphcalc
//!
//! Library half of the graphcalc binary: configuration loading, graph input
//! and the CLI command implementations.

pub mod cli;
pub mod config;
pub mod input;
