//! Snapshot merger
//!
//! Folds newly fetched rows into the existing snapshot, one row per
//! temporal key, the incoming row winning any tie.

use crate::frame::{Cell, Frame};
use std::collections::HashSet;

/// Result of merging fetched rows into a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Nothing new arrived; the snapshot must not be rewritten
    Unchanged,
    /// The merged snapshot with counts of new and overwritten keys
    Merged {
        frame: Frame,
        added: usize,
        replaced: usize,
    },
}

impl MergeOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Key-based merger for table snapshots
#[derive(Debug, Clone)]
pub struct SnapshotMerger {
    temporal_column: String,
}

impl SnapshotMerger {
    pub fn new(temporal_column: impl Into<String>) -> Self {
        Self {
            temporal_column: temporal_column.into(),
        }
    }

    /// Merge `incoming` into `existing`
    ///
    /// Columns are the union of both sides, existing columns first. When the
    /// temporal column is missing the merge falls back to exact-row
    /// deduplication. The result is sorted by temporal key.
    pub fn merge(&self, existing: Option<&Frame>, incoming: &Frame) -> MergeOutcome {
        if incoming.is_empty() {
            return MergeOutcome::Unchanged;
        }

        let base = existing.cloned().unwrap_or_default();
        let mut merged = base.concat(incoming);

        let Some(key_idx) = merged.column_index(&self.temporal_column) else {
            let before = base.num_rows();
            merged.drop_duplicate_rows();
            let added = merged.num_rows().saturating_sub(before);
            return MergeOutcome::Merged {
                frame: merged,
                added,
                replaced: 0,
            };
        };

        let existing_keys: HashSet<Cell> = base
            .column_index(&self.temporal_column)
            .map(|idx| base.column(idx).cloned().collect())
            .unwrap_or_default();
        let incoming_keys: HashSet<Cell> = incoming
            .column_index(&self.temporal_column)
            .map(|idx| incoming.column(idx).cloned().collect())
            .unwrap_or_default();
        let replaced = incoming_keys.intersection(&existing_keys).count();

        let before = merged.num_rows();
        let collapsed = merged.dedup_by_column(key_idx);
        merged.sort_by_date(key_idx);
        let added = (before - collapsed).saturating_sub(base.num_rows());

        MergeOutcome::Merged {
            frame: merged,
            added,
            replaced,
        }
    }
}
