//! Cell values and column kinds
//!
//! A `Cell` is one value in a frame. Remote rows arrive as JSON and
//! snapshots come back from Parquet; both are normalized into this enum so the
//! auditor and the cleansing steps can reason about values without caring
//! where they came from.

use crate::types::JsonValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Format used when dates are rendered into reports
pub const REPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single table value
#[derive(Debug, Clone, Default)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    /// Convert a JSON value into a cell
    ///
    /// Strings stay text even when they look like dates; the temporal column
    /// is parsed explicitly by the caller.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Cell::Null,
            JsonValue::Bool(b) => Cell::Bool(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Cell::Int)
                .or_else(|| n.as_f64().map(Cell::Float))
                .unwrap_or(Cell::Null),
            JsonValue::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Render this cell for a JSON report
    pub fn to_json(&self) -> JsonValue {
        match self {
            Cell::Null => JsonValue::Null,
            Cell::Bool(b) => JsonValue::Bool(*b),
            Cell::Int(i) => JsonValue::Number((*i).into()),
            Cell::Float(f) => serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Cell::Text(s) => JsonValue::String(s.clone()),
            Cell::Date(d) => JsonValue::String(
                d.and_hms_opt(0, 0, 0)
                    .map(|dt| dt.format(REPORT_DATETIME_FORMAT).to_string())
                    .unwrap_or_else(|| d.to_string()),
            ),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    /// Numeric view of the cell (ints widen to f64)
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether a 0/1 flag column is set; `true`, `1` and `1.0` all count
    pub fn is_flag_set(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Int(i) => *i == 1,
            Cell::Float(f) => *f == 1.0,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Date view of the cell, parsing text when needed
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Kind of a non-null cell
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Cell::Null => None,
            Cell::Bool(_) => Some(ColumnKind::Bool),
            Cell::Int(_) => Some(ColumnKind::Int),
            Cell::Float(_) => Some(ColumnKind::Float),
            Cell::Text(_) => Some(ColumnKind::Text),
            Cell::Date(_) => Some(ColumnKind::Date),
        }
    }

    /// Numeric comparison; `None` when either side is not a number
    pub fn numeric_cmp(&self, other: &Cell) -> Option<Ordering> {
        self.as_f64()?.partial_cmp(&other.as_f64()?)
    }

    /// Row-wise inequality as arithmetic checks see it: a missing operand
    /// never equals anything
    pub fn differs(&self, other: &Cell) -> bool {
        self.numeric_cmp(other) != Some(Ordering::Equal)
    }

    /// Whether this cell equals the given sentinel literal
    pub fn matches_sentinel(&self, literal: &Cell) -> bool {
        match (self, literal) {
            (Cell::Null, _) | (_, Cell::Null) => false,
            (a, b) if a.is_numeric() && b.is_numeric() => {
                a.numeric_cmp(b) == Some(Ordering::Equal)
            }
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Date(d), Cell::Text(s)) => parse_date(s).is_some_and(|p| p == *d),
            (Cell::Date(a), Cell::Date(b)) => a == b,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Int(a), Cell::Int(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Date(a), Cell::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Null => {}
            Cell::Bool(b) => b.hash(state),
            Cell::Int(i) => i.hash(state),
            Cell::Float(f) => canonical_bits(*f).hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Date(d) => d.hash(state),
        }
    }
}

/// Bits of a float with `-0.0` and every NaN collapsed, so equal cells hash equally
fn canonical_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0_f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// Parse the date formats the remote service and older snapshots emit
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

// ============================================================================
// Arithmetic
// ============================================================================

/// `a + b`, null when either side is missing or not numeric
pub fn add(a: &Cell, b: &Cell) -> Cell {
    match (a, b) {
        (Cell::Int(x), Cell::Int(y)) => x
            .checked_add(*y)
            .map_or_else(|| float_op(a, b, |x, y| x + y), Cell::Int),
        _ => float_op(a, b, |x, y| x + y),
    }
}

/// `a - b`, null when either side is missing or not numeric
pub fn sub(a: &Cell, b: &Cell) -> Cell {
    match (a, b) {
        (Cell::Int(x), Cell::Int(y)) => x
            .checked_sub(*y)
            .map_or_else(|| float_op(a, b, |x, y| x - y), Cell::Int),
        _ => float_op(a, b, |x, y| x - y),
    }
}

/// `num / den`, with a zero denominator yielding 0
pub fn ratio_or_zero(num: &Cell, den: &Cell) -> Cell {
    match (num.as_f64(), den.as_f64()) {
        (_, Some(d)) if d == 0.0 => Cell::Float(0.0),
        (Some(n), Some(d)) => Cell::Float(n / d),
        _ => Cell::Null,
    }
}

fn float_op(a: &Cell, b: &Cell, op: impl Fn(f64, f64) -> f64) -> Cell {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Cell::Float(op(x, y)),
        _ => Cell::Null,
    }
}

// ============================================================================
// Column Kind
// ============================================================================

/// Apparent type of a column, inferred from its non-null cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Only nulls (or no rows)
    Empty,
    Bool,
    Int,
    Float,
    Text,
    Date,
    /// Incompatible kinds in one column
    Mixed,
}

impl ColumnKind {
    /// Merge two kinds into a compatible kind
    pub fn merge(self, other: ColumnKind) -> ColumnKind {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnKind::Empty, other) | (other, ColumnKind::Empty) => other,
            (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => ColumnKind::Mixed,
        }
    }

    /// Infer the kind of a column from its cells
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> ColumnKind {
        cells
            .into_iter()
            .filter_map(Cell::kind)
            .fold(ColumnKind::Empty, ColumnKind::merge)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Empty => "empty",
            ColumnKind::Bool => "bool",
            ColumnKind::Int => "int",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
            ColumnKind::Mixed => "mixed",
        };
        write!(f, "{name}")
    }
}
