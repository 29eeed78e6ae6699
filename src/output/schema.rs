//! Frame to Arrow conversion
//!
//! Maps frame columns onto Arrow arrays by their apparent kind and back.
//! Dates are stored as `Date32`; text and mixed columns as `Utf8`; a
//! column with no values at all as a nullable `Float64`.

use crate::error::{Error, Result};
use crate::frame::{Cell, ColumnKind, Frame};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;

/// Schema metadata key naming the index column(s), as a JSON array
pub const INDEX_METADATA_KEY: &str = "index_columns";

/// Days between 0001-01-01 (CE day 1) and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Arrow type used to persist a column of the given kind
pub fn arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Bool => DataType::Boolean,
        ColumnKind::Int => DataType::Int64,
        ColumnKind::Float | ColumnKind::Empty => DataType::Float64,
        ColumnKind::Date => DataType::Date32,
        ColumnKind::Text | ColumnKind::Mixed => DataType::Utf8,
    }
}

/// Arrow schema for a frame, recording `index` in the metadata if given
pub fn frame_schema(frame: &Frame, index: Option<&str>) -> Schema {
    let fields: Vec<Field> = frame
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| Field::new(name, arrow_type(frame.column_kind(i)), true))
        .collect();

    let mut metadata = HashMap::new();
    if let Some(index) = index {
        metadata.insert(
            INDEX_METADATA_KEY.to_string(),
            serde_json::json!([index]).to_string(),
        );
    }
    Schema::new_with_metadata(fields, metadata)
}

/// Convert a frame into a single RecordBatch
pub fn frame_to_arrow(frame: &Frame, index: Option<&str>) -> Result<RecordBatch> {
    let schema = Arc::new(frame_schema(frame, index));

    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| build_array(frame, i, field.data_type()))
        .collect();

    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    RecordBatch::try_new(schema, columns).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

fn build_array(frame: &Frame, idx: usize, data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Boolean => Arc::new(
            frame
                .column(idx)
                .map(|c| match c {
                    Cell::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        DataType::Int64 => Arc::new(
            frame
                .column(idx)
                .map(|c| match c {
                    Cell::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        DataType::Date32 => Arc::new(
            frame
                .column(idx)
                .map(|c| c.as_date().map(date_to_days))
                .collect::<Date32Array>(),
        ),
        DataType::Utf8 => Arc::new(
            frame
                .column(idx)
                .map(|c| (!c.is_null()).then(|| c.to_string()))
                .collect::<StringArray>(),
        ),
        _ => Arc::new(frame.column(idx).map(Cell::as_f64).collect::<Float64Array>()),
    }
}

/// Convert record batches back into a frame
///
/// Returns the frame and the index column recorded in the schema metadata,
/// if any. Integer, float, string and temporal Arrow types are normalized;
/// timestamps become dates.
pub fn arrow_to_frame(schema: &Schema, batches: &[RecordBatch]) -> Result<(Frame, Option<String>)> {
    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let mut frame = Frame::new(columns);

    for batch in batches {
        let arrays = batch
            .columns()
            .iter()
            .map(|array| normalize(array))
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            frame.push_row(arrays.iter().map(|a| read_cell(a.as_ref(), row)).collect());
        }
    }

    let index = schema
        .metadata()
        .get(INDEX_METADATA_KEY)
        .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .and_then(|names| names.into_iter().next());

    Ok((frame, index))
}

/// Cast an array onto one of the five types `read_cell` understands
fn normalize(array: &ArrayRef) -> Result<ArrayRef> {
    let target = match array.data_type() {
        DataType::Boolean | DataType::Int64 | DataType::Float64 | DataType::Date32 | DataType::Utf8 => {
            return Ok(array.clone())
        }
        DataType::Null => return Ok(array.clone()),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 | DataType::Decimal128(_, _) => DataType::Float64,
        DataType::Date64 | DataType::Timestamp(_, _) => DataType::Date32,
        _ => DataType::Utf8,
    };
    Ok(cast(array, &target)?)
}

fn read_cell(array: &dyn Array, row: usize) -> Cell {
    if array.is_null(row) {
        return Cell::Null;
    }
    match array.data_type() {
        DataType::Boolean => Cell::Bool(array.as_boolean().value(row)),
        DataType::Int64 => Cell::Int(array.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => {
            let value = array.as_primitive::<Float64Type>().value(row);
            if value.is_nan() {
                Cell::Null
            } else {
                Cell::Float(value)
            }
        }
        DataType::Date32 => {
            days_to_date(array.as_primitive::<Date32Type>().value(row)).map_or(Cell::Null, Cell::Date)
        }
        DataType::Utf8 => Cell::Text(array.as_string::<i32>().value(row).to_string()),
        _ => Cell::Null,
    }
}

/// Days since the Unix epoch for a date
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Date for a count of days since the Unix epoch
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}
