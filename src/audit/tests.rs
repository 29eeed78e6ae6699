//! Tests for the audit module

use super::*;
use crate::config::{PipelineConfig, SchemaContract, SentinelCatalog};
use crate::frame::{Cell, ColumnKind, Frame};
use crate::types::ColumnType;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use test_case::test_case;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn frame(columns: &[&str], rows: Vec<Vec<Cell>>) -> Frame {
    Frame::from_rows(columns.iter().map(|c| (*c).to_string()).collect(), rows).unwrap()
}

fn sales_schema() -> SchemaContract {
    SchemaContract::new(vec![
        ("date".to_string(), ColumnType::Date),
        ("total_units".to_string(), ColumnType::Int),
        ("paid_units".to_string(), ColumnType::Int),
        ("bonus_units".to_string(), ColumnType::Int),
        ("is_promotion".to_string(), ColumnType::Int),
    ])
}

const SALES_COLUMNS: [&str; 5] = ["date", "total_units", "paid_units", "bonus_units", "is_promotion"];

fn sales_row(date: NaiveDate, total: i64, paid: i64, bonus: i64, promo: i64) -> Vec<Cell> {
    vec![
        date.into(),
        total.into(),
        paid.into(),
        bonus.into(),
        promo.into(),
    ]
}

// ============================================================================
// Contract
// ============================================================================

#[test]
fn test_contract_valid() {
    let f = frame(&SALES_COLUMNS, vec![sales_row(d(2024, 1, 1), 10, 10, 0, 0)]);
    let result = validate_contract(&f, Some(&sales_schema()));
    assert!(result.is_contract_valid);
    assert!(result.missing_columns.is_empty());
    assert!(result.extra_columns.is_empty());
}

#[test]
fn test_contract_missing_extra_and_mismatch() {
    let f = frame(
        &["date", "total_units", "paid_units", "bonus_units", "store"],
        vec![vec![
            d(2024, 1, 1).into(),
            Cell::Float(10.5),
            10.into(),
            0.into(),
            "north".into(),
        ]],
    );
    let result = validate_contract(&f, Some(&sales_schema()));

    assert!(!result.is_contract_valid);
    assert_eq!(result.missing_columns, vec!["is_promotion"]);
    assert_eq!(result.extra_columns, vec!["store"]);
    assert_eq!(
        result.type_mismatches.get("total_units"),
        Some(&TypeMismatch {
            expected: ColumnType::Int,
            actual: ColumnKind::Float,
        })
    );
}

#[test]
fn test_contract_extra_columns_alone_stay_valid() {
    let f = frame(
        &["date", "total_units", "paid_units", "bonus_units", "is_promotion", "note"],
        vec![vec![
            d(2024, 1, 1).into(),
            1.into(),
            1.into(),
            0.into(),
            0.into(),
            "x".into(),
        ]],
    );
    let result = validate_contract(&f, Some(&sales_schema()));
    assert!(result.is_contract_valid);
    assert_eq!(result.extra_columns, vec!["note"]);
}

#[test]
fn test_contract_all_null_column_never_mismatches() {
    let f = frame(
        &SALES_COLUMNS,
        vec![vec![d(2024, 1, 1).into(), Cell::Null, 1.into(), 0.into(), 0.into()]],
    );
    assert!(validate_contract(&f, Some(&sales_schema())).is_contract_valid);
}

#[test]
fn test_contract_reports_duplicate_names() {
    let f = frame(&["date", "date"], vec![vec![d(2024, 1, 1).into(), d(2024, 1, 1).into()]]);
    let result = validate_contract(&f, None);
    assert_eq!(result.duplicated_columns, vec!["date"]);
}

// ============================================================================
// Integrity
// ============================================================================

#[test]
fn test_integrity_counts_gaps() {
    let f = frame(
        &["date", "v"],
        vec![
            vec![d(2024, 1, 1).into(), 1.into()],
            vec![d(2024, 1, 2).into(), 1.into()],
            vec![d(2024, 1, 2).into(), 1.into()],
            vec![d(2024, 1, 5).into(), 2.into()],
        ],
    );
    let checks = check_integrity(&f, "date");

    assert_eq!(checks.duplicated_rows_count, 1);
    assert_eq!(checks.duplicated_dates_count, Some(1));
    assert_eq!(
        checks.date_gaps,
        Some(DateGaps::Counted {
            date_gaps_count: 2,
            date_gaps_sample: vec!["2024-01-03".to_string(), "2024-01-04".to_string()],
        })
    );
}

#[test]
fn test_integrity_gap_sample_is_capped() {
    let present = [d(2024, 1, 1), d(2024, 1, 20)].into_iter().collect();
    assert_eq!(missing_days(&present).len(), 18);

    let f = frame(&["date"], vec![vec![d(2024, 1, 1).into()], vec![d(2024, 1, 20).into()]]);
    match check_integrity(&f, "date").date_gaps {
        Some(DateGaps::Counted {
            date_gaps_count,
            date_gaps_sample,
        }) => {
            assert_eq!(date_gaps_count, 18);
            assert_eq!(date_gaps_sample.len(), 5);
        }
        other => panic!("unexpected gaps: {other:?}"),
    }
}

#[test]
fn test_integrity_unparseable_dates_not_applicable() {
    let f = frame(
        &["date"],
        vec![vec![d(2024, 1, 1).into()], vec!["yesterday".into()]],
    );
    let checks = check_integrity(&f, "date");
    assert!(matches!(checks.date_gaps, Some(DateGaps::NotApplicable { .. })));

    let json = serde_json::to_value(&checks).unwrap();
    assert!(json["date_gaps_count"].is_string());
}

#[test]
fn test_integrity_without_temporal_column() {
    let f = frame(&["v"], vec![vec![1.into()], vec![1.into()]]);
    let checks = check_integrity(&f, "date");
    assert_eq!(checks.duplicated_rows_count, 1);
    assert_eq!(checks.duplicated_dates_count, None);

    let json = serde_json::to_value(&checks).unwrap();
    assert_eq!(json, json!({"duplicated_rows_count": 1}));
}

// ============================================================================
// Quality
// ============================================================================

fn catalog() -> SentinelCatalog {
    let mut categories = BTreeMap::new();
    categories.insert("numeric".to_string(), vec![json!(-999)]);
    categories.insert("object".to_string(), vec![json!("N/A")]);
    categories.insert("datetime".to_string(), vec![json!("1900-01-01")]);
    SentinelCatalog::new(categories)
}

#[test]
fn test_quality_nulls_and_sentinels() {
    let f = frame(
        &["date", "units", "label"],
        vec![
            vec![d(1900, 1, 1).into(), Cell::Int(-999), "N/A".into()],
            vec![d(2024, 1, 2).into(), Cell::Null, "ok".into()],
            vec![d(2024, 1, 3).into(), Cell::Float(-999.0), Cell::Null],
        ],
    );
    let metrics = analyze_quality(&f, &catalog());

    assert_eq!(metrics.null_counts["units"], 1);
    assert_eq!(metrics.null_counts["label"], 1);
    assert_eq!(metrics.sentinel_counts["units"], 2);
    assert_eq!(metrics.sentinel_counts["label"], 1);
    assert_eq!(metrics.sentinel_counts["date"], 1);
}

#[test]
fn test_quality_zero_variance() {
    let f = frame(
        &["flag", "units"],
        vec![
            vec![1.into(), 1.into()],
            vec![1.into(), 2.into()],
            vec![Cell::Null, 3.into()],
        ],
    );
    let metrics = analyze_quality(&f, &SentinelCatalog::default());
    assert_eq!(metrics.zero_variance_cols, vec!["flag"]);
    assert!(metrics.sentinel_counts.is_empty());
}

#[test_case(51, true ; "above threshold")]
#[test_case(50, false ; "at threshold")]
fn test_quality_high_cardinality(rows: usize, expected: bool) {
    let f = frame(
        &["id"],
        (0..rows).map(|i| vec![Cell::Text(format!("id-{i}"))]).collect(),
    );
    let metrics = analyze_quality(&f, &SentinelCatalog::default());
    assert_eq!(metrics.high_cardinality_cols.contains(&"id".to_string()), expected);
}

// ============================================================================
// Profile
// ============================================================================

#[test]
fn test_quantile_linear_interpolation() {
    let sorted = [1.0, 2.0, 3.0, 4.0];
    assert!((quantile(&sorted, 0.25) - 1.75).abs() < 1e-9);
    assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-9);
    assert!((quantile(&sorted, 0.75) - 3.25).abs() < 1e-9);
    assert!((quantile(&[7.0], 0.5) - 7.0).abs() < 1e-9);
}

#[test]
fn test_profile_numeric_with_outlier() {
    let schema = SchemaContract::new(vec![("units".to_string(), ColumnType::Int)]);
    let f = frame(
        &["units"],
        [10, 11, 12, 13, 100].iter().map(|v| vec![Cell::Int(*v)]).collect(),
    );
    let profile = generate_profile(&f, Some(&schema), "date");
    let units = &profile.numeric["units"];

    assert_eq!(units.count, 5);
    assert!((units.mean - 29.2).abs() < 1e-9);
    assert!((units.p50 - 12.0).abs() < 1e-9);
    assert!((units.range - 90.0).abs() < 1e-9);
    assert!((units.iqr_stats.iqr - 2.0).abs() < 1e-9);
    assert_eq!(units.iqr_stats.outliers_above, 1);
    assert_eq!(units.iqr_stats.outliers_below, 0);
    assert_eq!(units.iqr_stats.total_outliers, 1);
}

#[test]
fn test_profile_single_value_has_no_std() {
    let schema = SchemaContract::new(vec![("units".to_string(), ColumnType::Float)]);
    let f = frame(&["units"], vec![vec![Cell::Float(4.0)], vec![Cell::Null]]);
    let profile = generate_profile(&f, Some(&schema), "date");
    assert_eq!(profile.numeric["units"].std, None);
    assert_eq!(profile.numeric["units"].count, 1);
}

#[test]
fn test_profile_undeclared_numeric_is_skipped() {
    let f = frame(&["units"], vec![vec![1.into()]]);
    let profile = generate_profile(&f, None, "date");
    assert!(profile.numeric.is_empty());
    assert!(profile.categorical.is_empty());
}

#[test]
fn test_profile_categorical() {
    let f = frame(
        &["date", "rain_type"],
        vec![
            vec!["2024-01-01".into(), "Drizzle".into()],
            vec!["2024-01-02".into(), "None".into()],
            vec!["2024-01-03".into(), "None".into()],
            vec!["2024-01-04".into(), Cell::Null],
        ],
    );
    let profile = generate_profile(&f, None, "date");

    assert!(!profile.categorical.contains_key("date"));
    let rain = &profile.categorical["rain_type"];
    assert_eq!(rain.unique_count, 2);
    assert_eq!(rain.mode.as_deref(), Some("None"));
    assert!((rain.top_weight - 0.5).abs() < 1e-9);
    assert_eq!(
        rain.top_values,
        vec![
            ValueCount {
                value: "None".to_string(),
                count: 2
            },
            ValueCount {
                value: "Drizzle".to_string(),
                count: 1
            },
        ]
    );
}

// ============================================================================
// Business rules
// ============================================================================

#[test]
fn test_rules_clean_sales() {
    let f = frame(
        &SALES_COLUMNS,
        vec![
            sales_row(d(2024, 1, 1), 20, 10, 10, 1),
            sales_row(d(2024, 1, 2), 8, 8, 0, 0),
        ],
    );
    let result = validate_business_rules(&f, "sales", Some(&sales_schema())).unwrap();
    assert_eq!(result.violations_count, 0);
    assert!(result.details.is_empty());
    assert!(result.skipped_rules.is_empty());
}

#[test]
fn test_rules_sales_violations_count_once_per_rule() {
    let f = frame(
        &SALES_COLUMNS,
        vec![
            // parity and total broken
            sales_row(d(2024, 1, 1), 20, 12, 10, 1),
            sales_row(d(2024, 1, 2), 25, 15, 10, 1),
            // bonus without promotion
            sales_row(d(2024, 1, 3), 9, 8, 1, 0),
            // negative
            sales_row(d(2024, 1, 4), -1, -1, 0, 0),
        ],
    );
    let result = validate_business_rules(&f, "sales", Some(&sales_schema())).unwrap();

    // negative total_units, negative paid_units, parity, flag, total
    assert_eq!(result.violations_count, 5);
    assert!(result
        .details
        .iter()
        .any(|d| d.starts_with("promotion_bonus_parity: 2 rows")));
    assert!(result
        .details
        .iter()
        .any(|d| d.starts_with("promotion_flag_consistency: 1 rows")));
    assert!(result.details.iter().any(|d| d.starts_with("units_total: 1 rows")));
}

#[test]
fn test_rules_boolean_promotion_flag() {
    let mut row = sales_row(d(2024, 1, 1), 15, 10, 5, 0);
    row[4] = Cell::Bool(true);
    let f = frame(&SALES_COLUMNS, vec![row]);

    let result = validate_business_rules(&f, "sales", Some(&sales_schema())).unwrap();

    assert_eq!(result.violations_count, 1);
    assert!(result.details[0].starts_with("promotion_bonus_parity: 1 rows"));
}

#[test]
fn test_rules_null_operand_breaks_identity_only() {
    let f = frame(
        &SALES_COLUMNS,
        vec![vec![
            d(2024, 1, 1).into(),
            10.into(),
            Cell::Null,
            0.into(),
            Cell::Null,
        ]],
    );
    let result = validate_business_rules(&f, "sales", Some(&sales_schema())).unwrap();
    assert_eq!(result.violations_count, 1);
    assert!(result.details[0].starts_with("units_total"));
}

#[test]
fn test_rules_skip_when_columns_absent() {
    let f = frame(
        &["date", "paid_units", "bonus_units"],
        vec![vec![d(2024, 1, 1).into(), 1.into(), 0.into()]],
    );
    let result = validate_business_rules(&f, "sales", Some(&sales_schema())).unwrap();
    assert_eq!(result.violations_count, 0);
    assert_eq!(result.skipped_rules.len(), 3);
    assert!(result.skipped_rules[0].starts_with("promotion_bonus_parity"));
}

#[test]
fn test_rules_inventory() {
    let columns = [
        "date",
        "paid_sales",
        "bonus_sales",
        "total_sales",
        "units_prepared",
        "units_wasted",
        "units_stocked_out",
        "theoretical_demand",
    ];
    let f = frame(
        &columns,
        vec![
            // consistent
            vec![
                d(2024, 1, 1).into(),
                100.into(),
                0.into(),
                100.into(),
                150.into(),
                50.into(),
                10.into(),
                160.into(),
            ],
            // waste and stockout broken
            vec![
                d(2024, 1, 2).into(),
                100.into(),
                0.into(),
                100.into(),
                150.into(),
                40.into(),
                10.into(),
                150.into(),
            ],
        ],
    );
    let result = validate_business_rules(&f, "inventory", None).unwrap();
    assert_eq!(result.violations_count, 2);
    assert!(result.details[0].starts_with("waste_balance: 1 rows"));
    assert!(result.details[1].starts_with("stockout_balance: 1 rows"));
}

#[test]
fn test_rules_text_in_numeric_column_fails() {
    let f = frame(
        &SALES_COLUMNS,
        vec![vec![
            d(2024, 1, 1).into(),
            "ten".into(),
            10.into(),
            0.into(),
            0.into(),
        ]],
    );
    assert!(validate_business_rules(&f, "sales", Some(&sales_schema())).is_err());
}

#[test]
fn test_rules_unknown_table_is_clean() {
    let f = frame(&["x"], vec![vec![Cell::Int(-5)]]);
    let result = validate_business_rules(&f, "customers", None).unwrap();
    assert_eq!(result, BusinessRuleValidation::default());
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_preview_empty() {
    let f = frame(&["date"], Vec::new());
    assert!(matches!(preview(&f), Preview::Empty { .. }));
}

#[test]
fn test_preview_rows_and_reproducible_sample() {
    let f = frame(
        &["date", "v"],
        (1..=10)
            .map(|i| vec![d(2024, 1, i).into(), Cell::Int(i64::from(i))])
            .collect(),
    );
    let first = preview(&f);
    assert_eq!(first, preview(&f));

    match first {
        Preview::Rows {
            first_3_rows,
            last_3_rows,
            sample_3_rows,
        } => {
            assert_eq!(first_3_rows.len(), 3);
            assert_eq!(first_3_rows[0]["date"], json!("2024-01-01 00:00:00"));
            assert_eq!(last_3_rows[2]["v"], json!(10));
            assert_eq!(sample_3_rows.len(), 3);
        }
        Preview::Empty { .. } => panic!("expected rows"),
    }
}

#[test]
fn test_preview_short_frame_samples_all_rows() {
    let f = frame(&["v"], vec![vec![1.into()], vec![2.into()]]);
    match preview(&f) {
        Preview::Rows { sample_3_rows, .. } => assert_eq!(sample_3_rows.len(), 2),
        Preview::Empty { .. } => panic!("expected rows"),
    }
}

// ============================================================================
// Auditor
// ============================================================================

const CONFIG: &str = r#"
general:
  data_raw_path: data/raw
  data_cleansed_path: data/cleansed
  outputs_path: outputs
extractions:
  tables: [sales]
  schemas:
    sales:
      date: datetime
      total_units: int
      paid_units: int
      bonus_units: int
      is_promotion: int
  sentinel_values:
    numeric: [-999]
"#;

#[test]
fn test_auditor_runs_every_section() {
    let config = PipelineConfig::from_yaml_str(CONFIG).unwrap();
    let f = frame(
        &SALES_COLUMNS,
        vec![
            sales_row(d(2024, 1, 1), 20, 10, 10, 1),
            sales_row(d(2024, 1, 3), -999, 8, 0, 0),
        ],
    );
    let report = ContractAuditor::new(&config).audit(&f, "sales");

    assert_eq!(report.table_name, "sales");
    assert_eq!(report.shape, Shape { rows: 2, columns: 5 });
    assert!(report.contract_validation.completed().unwrap().is_contract_valid);
    assert_eq!(
        report.quality_metrics.completed().unwrap().sentinel_counts["total_units"],
        1
    );
    // -999 is negative and breaks the total
    assert_eq!(report.violations_count(), 2);
}

#[test]
fn test_auditor_isolates_failed_section() {
    let config = PipelineConfig::from_yaml_str(CONFIG).unwrap();
    let f = frame(
        &SALES_COLUMNS,
        vec![vec![
            d(2024, 1, 1).into(),
            "lots".into(),
            1.into(),
            0.into(),
            0.into(),
        ]],
    );
    let report = ContractAuditor::new(&config).audit(&f, "sales");

    assert!(report.business_rules_validation.is_failed());
    assert!(!report.integrity_checks.is_failed());
    assert!(!report.contract_validation.completed().unwrap().is_contract_valid);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["business_rules_validation"]["error"].is_string());
    assert_eq!(json["integrity_checks"]["duplicated_rows_count"], json!(0));
}
