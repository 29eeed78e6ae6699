// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # dailyset
//!
//! Incremental ingestion and consistency pipeline for a small business's
//! daily operational tables. It keeps local Parquet snapshots of remote
//! tables up to date, audits them, repairs them into gap-free daily series
//! and joins them into a single master dataset.
//!
//! ## Features
//!
//! - **Incremental Extraction**: Paged reads past the newest local date only
//! - **Idempotent Snapshots**: Key-based merge, rewritten only when rows change
//! - **Auditing**: Contract, integrity, quality, profile and business-rule checks
//! - **Cleansing**: Sentinel removal, deduplication, rule repair, daily reindex
//! - **Master Dataset**: Inner join of every cleansed table on the date
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dailyset::config::PipelineConfig;
//! use dailyset::engine::{ExtractionPhase, PreprocessingPhase};
//! use dailyset::remote::RestTableClient;
//!
//! #[tokio::main]
//! async fn main() -> dailyset::Result<()> {
//!     let config = PipelineConfig::from_file("config/config.yaml")?;
//!     let client = RestTableClient::new(
//!         "https://project.supabase.co",
//!         "service-key",
//!         &config.remote,
//!     )?;
//!
//!     let extraction = ExtractionPhase::new(&config, &client).run().await?;
//!     println!("{} rows ingested", extraction.metrics.total_rows_extracted);
//!
//!     let preprocessing = PreprocessingPhase::new(&config).run()?;
//!     println!("{:?}", preprocessing.master_audit.audit());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Phase 01: extract  RemoteTableClient → IncrementalFetcher       │
//! │                    → SnapshotMerger → SnapshotStore → Auditor   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Phase 02: preprocess  SnapshotStore → CleansingEngine           │
//! │                       → MasterMerger → master_data.parquet      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Remote  │   HTTP    │   Paginate    │   Frame   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ REST     │ Retry     │ Offset/limit  │ Cells     │ Parquet     │
//! │ Filters  │ Rate Limit│ Short page    │ Dedup     │ JSON report │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and classification
pub mod error;

/// Common types and type aliases
pub mod types;

/// Column names of the managed tables
pub mod domain;

/// In-memory tabular data
pub mod frame;

/// Pipeline configuration
pub mod config;

/// HTTP client with retry and rate limiting
pub mod http;

/// Offset/limit pagination
pub mod pagination;

/// Remote table access
pub mod remote;

/// Incremental fetch and snapshot merge
pub mod extract;

/// Parquet snapshots and JSON reports
pub mod output;

/// Snapshot auditing
pub mod audit;

/// Table cleansing
pub mod cleanse;

/// Master dataset join
pub mod master;

/// Phase run loops and reports
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::PipelineConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
