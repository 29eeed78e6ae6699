//! Tests for the master module

use super::*;
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::frame::{Cell, ColumnKind, Frame};
use crate::output::read_frame;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn frame(columns: &[&str], rows: Vec<Vec<Cell>>) -> Frame {
    Frame::from_rows(columns.iter().map(|c| (*c).to_string()).collect(), rows).unwrap()
}

fn merger() -> MasterMerger {
    let config = PipelineConfig::from_yaml_str(
        r#"
general:
  data_raw_path: data/raw
  data_cleansed_path: data/cleansed
  outputs_path: outputs
extractions:
  tables: [sales, weather]
"#,
    )
    .unwrap();
    MasterMerger::new(&config)
}

#[test]
fn test_single_row_join() {
    let sales = frame(&["total_units", "date"], vec![vec![20.into(), d(2023, 1, 1).into()]]);
    let weather = frame(
        &["date", "avg_temperature"],
        vec![vec![d(2023, 1, 1).into(), Cell::Float(18.5)]],
    );

    let master = merger()
        .merge_all(&[("sales".to_string(), sales), ("weather".to_string(), weather)])
        .unwrap();

    assert_eq!(master.num_rows(), 1);
    assert_eq!(master.index_name(), "date");
    assert_eq!(master.frame().columns(), ["date", "total_units", "avg_temperature"]);

    let audit = master.audit();
    assert_eq!(audit.total_rows, 1);
    assert_eq!(audit.total_columns, 2);
    assert_eq!(audit.null_values_count, 0);
    assert_eq!(audit.duplicate_rows, 0);
    assert_eq!(audit.duplicate_columns, 0);
    assert_eq!(audit.index_name, "date");
    assert_eq!(audit.columns_info["avg_temperature"], ColumnKind::Float);
    assert_eq!(
        audit.date_range,
        Some(DateRange {
            start: "2023-01-01T00:00:00".to_string(),
            end: "2023-01-01T00:00:00".to_string(),
        })
    );
}

#[test]
fn test_join_keeps_only_shared_dates() {
    let left = frame(
        &["date", "a"],
        (1..=5).map(|i| vec![d(2023, 1, i).into(), Cell::Int(i64::from(i))]).collect(),
    );
    let right = frame(
        &["date", "b"],
        (3..=8).map(|i| vec![d(2023, 1, i).into(), Cell::Int(i64::from(i) * 10)]).collect(),
    );

    let master = merger()
        .merge_all(&[("left".to_string(), left), ("right".to_string(), right)])
        .unwrap();

    assert_eq!(master.num_rows(), 3);
    let audit = master.audit();
    assert_eq!(audit.date_range.unwrap().start, "2023-01-03T00:00:00");
    assert_eq!(master.frame().cell(0, 2), &Cell::Int(30));
}

#[test]
fn test_colliding_columns_are_suffixed() {
    let a = frame(&["date", "note"], vec![vec![d(2023, 1, 1).into(), "x".into()]]);
    let b = frame(&["date", "note"], vec![vec![d(2023, 1, 1).into(), "y".into()]]);

    let master = merger()
        .merge_all(&[("a".to_string(), a), ("b".to_string(), b)])
        .unwrap();

    assert_eq!(master.frame().columns(), ["date", "note", "note_b"]);
    assert_eq!(master.audit().duplicate_columns, 0);
}

#[test]
fn test_no_tables_is_configuration_error() {
    let err = merger().merge_all(&[]).unwrap_err();
    assert!(matches!(err, Error::NoEligibleTables));
}

#[test]
fn test_table_without_key_fails() {
    let a = frame(&["date"], vec![vec![d(2023, 1, 1).into()]]);
    let b = frame(&["value"], vec![vec![1.into()]]);
    assert!(merger()
        .merge_all(&[("a".to_string(), a), ("b".to_string(), b)])
        .is_err());
}

#[test]
fn test_save_records_index() {
    let dir = TempDir::new().unwrap();
    let a = frame(
        &["date", "v"],
        vec![
            vec![d(2023, 1, 1).into(), Cell::Float(1.0)],
            vec![d(2023, 1, 2).into(), Cell::Float(2.0)],
        ],
    );
    let master = merger().merge_all(&[("a".to_string(), a)]).unwrap();

    let path = dir.path().join(MASTER_FILE_NAME);
    assert_eq!(master.save(&path).unwrap(), 2);

    let (loaded, index) = read_frame(&path).unwrap();
    assert_eq!(index.as_deref(), Some("date"));
    assert_eq!(loaded, *master.frame());
}
