//! Business-rule validation
//!
//! Rules are evaluated row by row. A rule counts once toward
//! `violations_count` no matter how many rows break it; the detail line
//! carries the row count.

use crate::config::SchemaContract;
use crate::domain::{inventory, sales, TableKind};
use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusinessRuleValidation {
    pub violations_count: usize,
    pub details: Vec<String>,
    /// Rules whose columns are not all present
    pub skipped_rules: Vec<String>,
}

impl BusinessRuleValidation {
    fn record(&mut self, rows: usize, detail: impl FnOnce(usize) -> String) {
        if rows > 0 {
            self.violations_count += 1;
            self.details.push(detail(rows));
        }
    }

    fn skip(&mut self, rule: &str, frame: &Frame, required: &[&str]) -> bool {
        let missing = frame.missing_columns(required);
        if missing.is_empty() {
            return false;
        }
        self.skipped_rules
            .push(format!("{rule} (missing: {})", missing.join(", ")));
        true
    }
}

/// Check the arithmetic identities that hold between columns of a table
///
/// Tables without domain rules always validate cleanly. Arithmetic over a
/// column holding text fails the whole check.
pub fn validate_business_rules(
    frame: &Frame,
    table: &str,
    schema: Option<&SchemaContract>,
) -> Result<BusinessRuleValidation> {
    let mut result = BusinessRuleValidation::default();
    let Some(kind) = TableKind::from_name(table) else {
        return Ok(result);
    };

    if kind.requires_non_negative() {
        for column in schema.map(SchemaContract::numeric_columns).unwrap_or_default() {
            let Some(idx) = frame.column_index(column) else {
                continue;
            };
            let mut negatives = 0;
            for row in frame.rows() {
                if numeric(&row[idx], column, table)?.is_some_and(|v| v < 0.0) {
                    negatives += 1;
                }
            }
            result.record(negatives, |n| {
                format!("Column '{column}': {n} negative values detected")
            });
        }
    }

    match kind {
        TableKind::Sales => check_sales(frame, table, &mut result)?,
        TableKind::Inventory => check_inventory(frame, table, &mut result)?,
        _ => {}
    }

    Ok(result)
}

fn check_sales(frame: &Frame, table: &str, result: &mut BusinessRuleValidation) -> Result<()> {
    let parity = [sales::IS_PROMOTION, sales::PAID_UNITS, sales::BONUS_UNITS];
    if !result.skip("promotion_bonus_parity", frame, &parity) {
        let [promo, paid, bonus] = columns(frame, parity);
        let mut rows = 0;
        for row in frame.rows() {
            numeric(&row[promo], sales::IS_PROMOTION, table)?;
            let on_promo = row[promo].is_flag_set();
            let paid = numeric(&row[paid], sales::PAID_UNITS, table)?;
            let bonus = numeric(&row[bonus], sales::BONUS_UNITS, table)?;
            if on_promo && !matches!((paid, bonus), (Some(p), Some(b)) if p == b) {
                rows += 1;
            }
        }
        result.record(rows, |n| {
            format!("promotion_bonus_parity: {n} rows where paid != bonus on a promotion day")
        });
    }

    let flag = [sales::IS_PROMOTION, sales::BONUS_UNITS];
    if !result.skip("promotion_flag_consistency", frame, &flag) {
        let [promo, bonus] = columns(frame, flag);
        let mut rows = 0;
        for row in frame.rows() {
            let set = row[promo].is_flag_set();
            let promo = numeric(&row[promo], sales::IS_PROMOTION, table)?;
            let bonus = numeric(&row[bonus], sales::BONUS_UNITS, table)?;
            let inconsistent = match (promo, bonus) {
                (Some(_), Some(b)) if set => b <= 0.0,
                (Some(p), Some(b)) if p == 0.0 => b > 0.0,
                _ => false,
            };
            if inconsistent {
                rows += 1;
            }
        }
        result.record(rows, |n| {
            format!("promotion_flag_consistency: {n} rows where bonus units disagree with the promotion flag")
        });
    }

    let total = [sales::TOTAL_UNITS, sales::PAID_UNITS, sales::BONUS_UNITS];
    if !result.skip("units_total", frame, &total) {
        let rows = count_sum_mismatches(frame, table, total, Op::Add)?;
        result.record(rows, |n| {
            format!("units_total: {n} rows where total units != paid + bonus")
        });
    }

    Ok(())
}

fn check_inventory(frame: &Frame, table: &str, result: &mut BusinessRuleValidation) -> Result<()> {
    let sales_total = [
        inventory::TOTAL_SALES,
        inventory::PAID_SALES,
        inventory::BONUS_SALES,
    ];
    if !result.skip("sales_total", frame, &sales_total) {
        let rows = count_sum_mismatches(frame, table, sales_total, Op::Add)?;
        result.record(rows, |n| {
            format!("sales_total: {n} rows where total sales != paid + bonus")
        });
    }

    let waste = [
        inventory::UNITS_WASTED,
        inventory::UNITS_PREPARED,
        inventory::TOTAL_SALES,
    ];
    if !result.skip("waste_balance", frame, &waste) {
        let rows = count_sum_mismatches(frame, table, waste, Op::Sub)?;
        result.record(rows, |n| {
            format!("waste_balance: {n} rows where wasted != prepared - total sales")
        });
    }

    let stockout = [
        inventory::UNITS_STOCKED_OUT,
        inventory::THEORETICAL_DEMAND,
        inventory::UNITS_PREPARED,
    ];
    if !result.skip("stockout_balance", frame, &stockout) {
        let rows = count_sum_mismatches(frame, table, stockout, Op::Sub)?;
        result.record(rows, |n| {
            format!("stockout_balance: {n} rows where stocked out != demand - prepared")
        });
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Op {
    Add,
    Sub,
}

/// Rows where `target != left (op) right`; a missing operand is a mismatch
fn count_sum_mismatches(
    frame: &Frame,
    table: &str,
    [target, left, right]: [&str; 3],
    op: Op,
) -> Result<usize> {
    let [t, l, r] = columns(frame, [target, left, right]);
    let mut rows = 0;
    for row in frame.rows() {
        let expected = match (numeric(&row[l], left, table)?, numeric(&row[r], right, table)?) {
            (Some(a), Some(b)) => match op {
                Op::Add => Some(a + b),
                Op::Sub => Some(a - b),
            },
            _ => None,
        };
        let actual = numeric(&row[t], target, table)?;
        if !matches!((actual, expected), (Some(a), Some(e)) if a == e) {
            rows += 1;
        }
    }
    Ok(rows)
}

/// Numeric view of a cell for rule arithmetic; text and dates are an error
fn numeric(cell: &Cell, column: &str, table: &str) -> Result<Option<f64>> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Cell::Int(_) | Cell::Float(_) => Ok(cell.as_f64()),
        Cell::Text(_) | Cell::Date(_) => Err(Error::integrity(
            table,
            format!("column '{column}' holds non-numeric value '{cell}'"),
        )),
    }
}

/// Positions of columns already known to be present
fn columns<const N: usize>(frame: &Frame, names: [&str; N]) -> [usize; N] {
    names.map(|name| frame.column_index(name).unwrap_or_default())
}
