//! CLI module
//!
//! Command-line interface for running the pipeline phases.
//!
//! # Commands
//!
//! - `extract` - Fetch, merge and audit every table
//! - `preprocess` - Cleanse tables and build the master dataset
//! - `run` - Both phases in order
//! - `validate` - Check the configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
