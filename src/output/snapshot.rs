//! Snapshot persistence
//!
//! Each table lives at `{raw}/{table}.parquet` ("latest") with a timestamped
//! copy under `{raw}/history/` for every change.

use super::history_path;
use super::writer::{read_frame, write_frame};
use crate::error::Result;
use crate::frame::Frame;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Paths written by one snapshot save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub latest: PathBuf,
    pub history: PathBuf,
    pub rows: usize,
}

/// Latest + history store for raw table snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stable path of a table's latest snapshot
    pub fn latest_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{table}.parquet"))
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join("history")
    }

    /// Load the latest snapshot of a table, `None` if there is none yet
    pub fn load(&self, table: &str) -> Result<Option<Frame>> {
        let path = self.latest_path(table);
        if !path.exists() {
            debug!(table, "No local snapshot");
            return Ok(None);
        }
        let (frame, _) = read_frame(&path)?;
        Ok(Some(frame))
    }

    /// Replace the latest snapshot and append a history copy
    pub fn save(&self, table: &str, frame: &Frame) -> Result<SavedSnapshot> {
        std::fs::create_dir_all(self.history_dir())?;

        let latest = self.latest_path(table);
        let rows = write_frame(&latest, frame, None)?;

        let history = history_path(
            &self.history_dir(),
            table,
            SNAPSHOT_TIMESTAMP_FORMAT,
            "parquet",
        );
        write_frame(&history, frame, None)?;

        info!(
            table,
            rows,
            latest = %latest.display(),
            history = %history.display(),
            "Snapshot saved"
        );
        Ok(SavedSnapshot {
            latest,
            history,
            rows,
        })
    }
}

/// Maximum temporal key in a snapshot
///
/// `None` when the column is absent or holds no parseable dates, which
/// sends the next fetch back to a full refresh.
pub fn snapshot_cursor(frame: &Frame, temporal_column: &str) -> Option<NaiveDate> {
    frame
        .column_index(temporal_column)
        .and_then(|idx| frame.max_date(idx))
}
