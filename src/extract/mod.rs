//! Extraction
//!
//! The fetch side of the pipeline: read new rows from the remote service
//! and fold them into the local snapshot.

mod fetcher;
mod merger;

pub use fetcher::{FetchedRows, IncrementalFetcher};
pub use merger::{MergeOutcome, SnapshotMerger};

#[cfg(test)]
mod tests;
