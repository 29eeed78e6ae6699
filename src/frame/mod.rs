//! Tabular core
//!
//! A small row-major table (`Frame`) over tagged values (`Cell`). Snapshots,
//! cleansed tables and the master dataset are all frames; the output module
//! converts them to and from Arrow for Parquet persistence.

mod cell;
mod table;

pub use cell::{add, parse_date, ratio_or_zero, sub, Cell, ColumnKind, REPORT_DATETIME_FORMAT};
pub use table::Frame;
