//! Schema contract validation

use crate::config::SchemaContract;
use crate::frame::{ColumnKind, Frame};
use crate::types::ColumnType;
use serde::Serialize;
use std::collections::BTreeMap;

/// Declared versus observed type of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMismatch {
    pub expected: ColumnType,
    pub actual: ColumnKind,
}

/// How a snapshot lines up with its declared contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractValidation {
    /// No missing columns and no type mismatches
    pub is_contract_valid: bool,
    pub missing_columns: Vec<String>,
    /// Present but undeclared; reported only
    pub extra_columns: Vec<String>,
    pub type_mismatches: BTreeMap<String, TypeMismatch>,
    pub duplicated_columns: Vec<String>,
}

/// Compare a frame's columns and apparent types against a contract
///
/// A table with no declared contract has every column reported as extra.
pub fn validate_contract(frame: &Frame, schema: Option<&SchemaContract>) -> ContractValidation {
    let empty = SchemaContract::default();
    let schema = schema.unwrap_or(&empty);

    let missing_columns: Vec<String> = schema
        .columns()
        .iter()
        .filter(|(name, _)| !frame.has_column(name))
        .map(|(name, _)| name.clone())
        .collect();

    let mut extra_columns: Vec<String> = Vec::new();
    for name in frame.columns() {
        if !schema.contains(name) && !extra_columns.contains(name) {
            extra_columns.push(name.clone());
        }
    }

    let type_mismatches: BTreeMap<String, TypeMismatch> = schema
        .columns()
        .iter()
        .filter_map(|(name, expected)| {
            let actual = frame.column_kind(frame.column_index(name)?);
            (!type_accepts(*expected, actual)).then(|| {
                (
                    name.clone(),
                    TypeMismatch {
                        expected: *expected,
                        actual,
                    },
                )
            })
        })
        .collect();

    ContractValidation {
        is_contract_valid: missing_columns.is_empty() && type_mismatches.is_empty(),
        missing_columns,
        extra_columns,
        type_mismatches,
        duplicated_columns: frame.duplicate_column_names(),
    }
}

/// Whether a column of `actual` kind satisfies a declared type
fn type_accepts(expected: ColumnType, actual: ColumnKind) -> bool {
    if actual == ColumnKind::Empty {
        return true;
    }
    match expected {
        ColumnType::Int => actual == ColumnKind::Int,
        ColumnType::Float => actual.is_numeric(),
        ColumnType::Date => matches!(actual, ColumnKind::Date | ColumnKind::Text),
        ColumnType::Text | ColumnType::Bool => true,
    }
}
