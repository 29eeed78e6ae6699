//! Master dataset
//!
//! Joins the cleansed tables on their shared temporal key into one wide
//! daily table. The key becomes the index: it is moved to the first column
//! and recorded as such in the Parquet schema metadata.

mod audit;

pub use audit::{DateRange, MasterAudit};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use crate::output::write_frame;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// File name of the master dataset inside the cleansed directory
pub const MASTER_FILE_NAME: &str = "master_data.parquet";

/// The joined dataset, indexed by the temporal key
#[derive(Debug, Clone, PartialEq)]
pub struct MasterDataset {
    frame: Frame,
    index: String,
}

impl MasterDataset {
    /// All columns, index first
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn num_rows(&self) -> usize {
        self.frame.num_rows()
    }

    /// Summarize the dataset's final health
    pub fn audit(&self) -> MasterAudit {
        MasterAudit::of(&self.frame, &self.index)
    }

    /// Write the dataset to Parquet with its index recorded
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rows = write_frame(path, &self.frame, Some(&self.index))?;
        info!(path = %path.display(), rows, "Master dataset saved");
        Ok(rows)
    }
}

/// Inner-joins cleansed tables on the temporal key
#[derive(Debug, Clone)]
pub struct MasterMerger {
    temporal_column: String,
}

impl MasterMerger {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            temporal_column: config.temporal_column().to_string(),
        }
    }

    /// Join tables in the given order
    ///
    /// A non-key column whose name is already taken is suffixed with
    /// `_{table}`. Fails when there is nothing to join or a table lacks the
    /// temporal key.
    pub fn merge_all(&self, tables: &[(String, Frame)]) -> Result<MasterDataset> {
        let Some(((first_name, first), rest)) = tables.split_first() else {
            return Err(Error::NoEligibleTables);
        };

        let mut master = self.keyed(first_name, first)?;
        for (name, frame) in rest {
            let right = self.keyed(name, frame)?;
            master = inner_join(&master, &right, name);
            debug!(table = %name, rows = master.num_rows(), "Joined into master");
        }

        info!(
            tables = tables.len(),
            rows = master.num_rows(),
            columns = master.num_columns(),
            "Master dataset built"
        );
        Ok(MasterDataset {
            frame: master,
            index: self.temporal_column.clone(),
        })
    }

    /// The table with its key moved to the first column
    fn keyed(&self, table: &str, frame: &Frame) -> Result<Frame> {
        let idx = frame.column_index(&self.temporal_column).ok_or_else(|| {
            Error::missing_columns(table, "master_merge", vec![self.temporal_column.clone()])
        })?;
        let mut order: Vec<usize> = vec![idx];
        order.extend((0..frame.num_columns()).filter(|i| *i != idx));

        let columns = order.iter().map(|&i| frame.columns()[i].clone()).collect();
        let rows = frame
            .rows()
            .iter()
            .map(|row| order.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Frame::from_rows(columns, rows)
    }
}

/// Inner join on the first column of both frames, keeping left row order
fn inner_join(left: &Frame, right: &Frame, right_table: &str) -> Frame {
    let mut columns = left.columns().to_vec();
    for name in right.columns().iter().skip(1) {
        if columns.contains(name) {
            columns.push(format!("{name}_{right_table}"));
        } else {
            columns.push(name.clone());
        }
    }

    let mut matches: HashMap<&Cell, Vec<&Vec<Cell>>> = HashMap::new();
    for row in right.rows() {
        if !row[0].is_null() {
            matches.entry(&row[0]).or_default().push(row);
        }
    }

    let mut out = Frame::new(columns);
    for left_row in left.rows() {
        let Some(right_rows) = matches.get(&left_row[0]) else {
            continue;
        };
        for right_row in right_rows {
            let mut row = left_row.clone();
            row.extend(right_row.iter().skip(1).cloned());
            out.push_row(row);
        }
    }
    out
}

#[cfg(test)]
mod tests;
