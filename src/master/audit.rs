//! Final health summary of the master dataset

use crate::frame::{ColumnKind, Frame};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

const ISO_MIDNIGHT: &str = "%Y-%m-%dT00:00:00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Shape and cleanliness of the joined dataset; the index is not counted as
/// a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterAudit {
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns_info: BTreeMap<String, ColumnKind>,
    pub null_values_count: usize,
    pub duplicate_rows: usize,
    pub duplicate_columns: usize,
    pub index_name: String,
    pub date_range: Option<DateRange>,
}

impl MasterAudit {
    pub(crate) fn of(frame: &Frame, index: &str) -> Self {
        let index_idx = frame.column_index(index);
        let value_columns: Vec<usize> = (0..frame.num_columns())
            .filter(|i| Some(*i) != index_idx)
            .collect();

        let columns_info = value_columns
            .iter()
            .map(|&i| (frame.columns()[i].clone(), frame.column_kind(i)))
            .collect();

        let null_values_count = value_columns
            .iter()
            .map(|&i| frame.column_null_count(i))
            .sum();

        let mut seen = HashSet::new();
        let duplicate_rows = frame
            .rows()
            .iter()
            .filter(|row| {
                let values: Vec<_> = value_columns.iter().map(|&i| &row[i]).collect();
                !seen.insert(values)
            })
            .count();

        let names: HashSet<&str> = value_columns
            .iter()
            .map(|&i| frame.columns()[i].as_str())
            .collect();

        let date_range = index_idx.and_then(|i| {
            let start = frame.min_date(i)?;
            let end = frame.max_date(i)?;
            Some(DateRange {
                start: start.format(ISO_MIDNIGHT).to_string(),
                end: end.format(ISO_MIDNIGHT).to_string(),
            })
        });

        Self {
            total_rows: frame.num_rows(),
            total_columns: value_columns.len(),
            columns_info,
            null_values_count,
            duplicate_rows,
            duplicate_columns: value_columns.len() - names.len(),
            index_name: index.to_string(),
            date_range,
        }
    }
}
