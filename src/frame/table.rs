//! Row-major in-memory table

use super::cell::{parse_date, Cell, ColumnKind};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// An ordered set of named columns over rows of cells
///
/// Column names are not required to be unique: snapshots read back from
/// external files may carry repeated names, which the auditor reports.
/// Lookups by name resolve to the first matching column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Create an empty frame with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a frame from columns and rows, checking row widths
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::Other(format!(
                "Row {i} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Build a frame from JSON records
    ///
    /// Columns are the union of record keys in first-seen order; a key absent
    /// from a record becomes a null cell. Non-object records are ignored.
    pub fn from_records(records: &[JsonValue]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for obj in records.iter().filter_map(JsonValue::as_object) {
            for key in obj.keys() {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(JsonValue::as_object)
            .map(|obj| {
                let mut row = vec![Cell::Null; columns.len()];
                for (key, value) in obj {
                    if let Some(&i) = positions.get(key) {
                        row[i] = Cell::from_json(value);
                    }
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Render rows as JSON objects (dates formatted for reports)
    pub fn to_records(&self) -> Vec<JsonObject> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Names from `required` that this frame lacks, in the given order
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| (*name).to_string())
            .collect()
    }

    /// Iterate over the cells of one column
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Apparent kind of a column
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        ColumnKind::infer(self.column(idx))
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    /// Mutable access to every row
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Vec<Cell>> + '_ {
        self.rows.iter_mut()
    }

    // ========================================================================
    // Shape
    // ========================================================================

    /// Append a row, padding or truncating it to the frame's width
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    /// Index of the named column, appending an all-null column if absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Null);
        }
        self.columns.len() - 1
    }

    /// Keep only the named columns, in the given order
    ///
    /// Names not present in the frame are ignored.
    pub fn select(&self, names: &[String]) -> Frame {
        let picks: Vec<(String, usize)> = names
            .iter()
            .filter_map(|name| self.column_index(name).map(|i| (name.clone(), i)))
            .collect();
        Frame {
            columns: picks.iter().map(|(name, _)| name.clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picks.iter().map(|(_, i)| row[*i].clone()).collect())
                .collect(),
        }
    }

    /// Rows at the given positions, in that order
    pub fn take(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    pub fn head(&self, n: usize) -> Frame {
        let end = n.min(self.rows.len());
        self.take(&(0..end).collect::<Vec<_>>())
    }

    pub fn tail(&self, n: usize) -> Frame {
        let start = self.rows.len().saturating_sub(n);
        self.take(&(start..self.rows.len()).collect::<Vec<_>>())
    }

    /// Drop rows failing the predicate; returns the number removed
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    /// Stack `other` under `self`, unioning columns (self's first)
    pub fn concat(&self, other: &Frame) -> Frame {
        let mut out = self.clone();
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| out.ensure_column(name))
            .collect();
        for row in &other.rows {
            let mut merged = vec![Cell::Null; out.columns.len()];
            for (cell, &target) in row.iter().zip(&mapping) {
                merged[target] = cell.clone();
            }
            out.rows.push(merged);
        }
        out
    }

    // ========================================================================
    // Counting
    // ========================================================================

    /// Total null cells across the frame
    pub fn null_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_null())
            .count()
    }

    pub fn column_null_count(&self, idx: usize) -> usize {
        self.column(idx).filter(|c| c.is_null()).count()
    }

    /// Rows identical to an earlier row
    pub fn duplicate_row_count(&self) -> usize {
        let distinct: HashSet<&Vec<Cell>> = self.rows.iter().collect();
        self.rows.len() - distinct.len()
    }

    /// Cells in a column equal to an earlier cell of that column
    pub fn duplicate_value_count(&self, idx: usize) -> usize {
        let distinct: HashSet<&Cell> = self.column(idx).collect();
        self.rows.len() - distinct.len()
    }

    /// Non-null distinct values in a column
    pub fn distinct_count(&self, idx: usize) -> usize {
        self.column(idx)
            .filter(|c| !c.is_null())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Column names that occur more than once, in first-seen order
    pub fn duplicate_column_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dups: Vec<String> = Vec::new();
        for name in &self.columns {
            if !seen.insert(name.as_str()) && !dups.contains(name) {
                dups.push(name.clone());
            }
        }
        dups
    }

    // ========================================================================
    // Deduplication
    // ========================================================================

    /// Collapse fully identical rows to their last occurrence
    ///
    /// Surviving rows keep their relative order. Returns the number removed.
    pub fn drop_duplicate_rows(&mut self) -> usize {
        let keep = keep_last(self.rows.iter());
        self.apply_keep(&keep)
    }

    /// Keep only the last row for each value of a column
    pub fn dedup_by_column(&mut self, idx: usize) -> usize {
        let keep = keep_last(self.rows.iter().map(|row| &row[idx]));
        self.apply_keep(&keep)
    }

    fn apply_keep(&mut self, keep: &[bool]) -> usize {
        let before = self.rows.len();
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(true));
        before - self.rows.len()
    }

    // ========================================================================
    // Temporal helpers
    // ========================================================================

    /// Stable ascending sort on a date column; unparseable cells sort first
    pub fn sort_by_date(&mut self, idx: usize) {
        self.rows.sort_by_key(|row| row[idx].as_date());
    }

    /// Largest date in a column
    pub fn max_date(&self, idx: usize) -> Option<NaiveDate> {
        self.column(idx).filter_map(Cell::as_date).max()
    }

    /// Smallest date in a column
    pub fn min_date(&self, idx: usize) -> Option<NaiveDate> {
        self.column(idx).filter_map(Cell::as_date).min()
    }

    /// Convert every parseable text cell in a column into a date
    ///
    /// Returns the raw text of the first cell that could not be parsed, if any.
    pub fn parse_dates_lenient(&mut self, idx: usize) -> Option<String> {
        let mut first_bad = None;
        for row in &mut self.rows {
            if let Cell::Text(raw) = &row[idx] {
                match parse_date(raw) {
                    Some(date) => row[idx] = Cell::Date(date),
                    None => {
                        if first_bad.is_none() {
                            first_bad = Some(raw.clone());
                        }
                    }
                }
            }
        }
        first_bad
    }

    /// Forward-fill then backward-fill nulls in a column
    ///
    /// Returns the number of cells filled.
    pub fn fill_forward_backward(&mut self, idx: usize) -> usize {
        let mut filled = 0;
        let mut last: Option<Cell> = None;
        for row in &mut self.rows {
            if row[idx].is_null() {
                if let Some(value) = &last {
                    row[idx] = value.clone();
                    filled += 1;
                }
            } else {
                last = Some(row[idx].clone());
            }
        }
        let mut next: Option<Cell> = None;
        for row in self.rows.iter_mut().rev() {
            if row[idx].is_null() {
                if let Some(value) = &next {
                    row[idx] = value.clone();
                    filled += 1;
                }
            } else {
                next = Some(row[idx].clone());
            }
        }
        filled
    }
}

/// Flags marking the last occurrence of each distinct item
fn keep_last<'a, T: std::hash::Hash + Eq + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<bool> {
    let items: Vec<&T> = items.collect();
    let mut seen: HashSet<&T> = HashSet::with_capacity(items.len());
    let mut keep = vec![false; items.len()];
    for (i, item) in items.iter().enumerate().rev() {
        keep[i] = seen.insert(*item);
    }
    keep
}
