//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Daily dataset ingestion and cleansing pipeline
#[derive(Parser, Debug)]
#[command(name = "dailyset")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true, default_value = "config/config.yaml")]
    pub config: PathBuf,

    /// Remote service URL, overrides `remote.url`
    #[arg(long, global = true, env = "SUPABASE_URL")]
    pub url: Option<String>,

    /// Remote service key, overrides `remote.api_key`
    #[arg(long, global = true, env = "SUPABASE_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Summary output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Exit non-zero when any table fails
    #[arg(long, global = true)]
    pub strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Fetch new rows, update raw snapshots and audit them
    Extract,

    /// Cleanse raw snapshots and build the master dataset
    Preprocess,

    /// Extract, then preprocess
    Run,

    /// Load and validate the configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Indented JSON
    Pretty,
}
