//! Daily calendar reindexing

use crate::frame::{Cell, Frame};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Result of expanding a table onto its full daily range
#[derive(Debug, Clone, PartialEq)]
pub struct Reindexed {
    pub frame: Frame,
    /// Rows inserted for days that were missing
    pub inserted: usize,
}

/// Expand a frame onto every calendar day between its first and last date
///
/// Expects one row per date. Inserted rows carry only their date; every other
/// cell is null. A frame with no dates is returned as is.
pub fn reindex_daily(frame: &Frame, date_idx: usize) -> Reindexed {
    let (Some(first), Some(last)) = (frame.min_date(date_idx), frame.max_date(date_idx)) else {
        return Reindexed {
            frame: frame.clone(),
            inserted: 0,
        };
    };

    let by_date: HashMap<NaiveDate, &Vec<Cell>> = frame
        .rows()
        .iter()
        .filter_map(|row| row[date_idx].as_date().map(|d| (d, row)))
        .collect();

    let mut out = Frame::new(frame.columns().to_vec());
    let mut inserted = 0;
    for day in first.iter_days().take_while(|d| *d <= last) {
        match by_date.get(&day) {
            Some(row) => out.push_row((*row).clone()),
            None => {
                let mut row = vec![Cell::Null; frame.num_columns()];
                row[date_idx] = Cell::Date(day);
                out.push_row(row);
                inserted += 1;
            }
        }
    }

    Reindexed {
        frame: out,
        inserted,
    }
}
