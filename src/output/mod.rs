//! Output module
//!
//! Handles everything the pipeline writes to disk.
//!
//! # Overview
//!
//! - Converting frames to Arrow RecordBatches and back
//! - Reading and writing Parquet files
//! - Raw table snapshots (latest + history)
//! - JSON phase reports (latest + history)

mod report;
mod schema;
mod snapshot;
mod writer;

pub use report::{ReportSink, SavedReport};
pub use schema::{
    arrow_to_frame, arrow_type, date_to_days, days_to_date, frame_schema, frame_to_arrow,
    INDEX_METADATA_KEY,
};
pub use snapshot::{snapshot_cursor, SavedSnapshot, SnapshotStore};
pub use writer::{read_frame, write_batch_to_parquet, write_frame, ParquetWriterConfig};

use std::path::{Path, PathBuf};

/// A fresh `{dir}/{stem}_{timestamp}.{ext}` path
///
/// A numeric suffix is added when two saves land on the same timestamp.
pub(crate) fn history_path(dir: &Path, stem: &str, timestamp_format: &str, ext: &str) -> PathBuf {
    let stamp = chrono::Local::now().format(timestamp_format).to_string();
    let mut path = dir.join(format!("{stem}_{stamp}.{ext}"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{stem}_{stamp}_{n}.{ext}"));
        n += 1;
    }
    path
}
