//! Pipeline configuration
//!
//! This module contains the configuration structures loaded from the pipeline
//! YAML file. One `PipelineConfig` is built at startup and passed by reference
//! to every component that needs it.

use crate::error::{Error, Result};
use crate::frame::Cell;
use crate::types::{ColumnType, JsonValue};
use chrono::{Datelike, NaiveDate};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Local storage locations
    pub general: GeneralConfig,

    /// Remote data service settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Managed tables, contracts and sentinel literals
    pub extractions: ExtractionConfig,

    /// Domain calendar parameters
    #[serde(default)]
    pub business_rules: BusinessRules,
}

impl PipelineConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.extractions.tables.is_empty() {
            return Err(Error::invalid_value(
                "extractions.tables",
                "at least one table must be listed",
            ));
        }
        if self.extractions.temporal_column.trim().is_empty() {
            return Err(Error::missing_field("extractions.temporal_column"));
        }
        if self.remote.page_size == 0 {
            return Err(Error::invalid_value(
                "remote.page_size",
                "must be greater than zero",
            ));
        }
        if let Some(rps) = self.remote.requests_per_second {
            if !(rps.is_finite() && rps > 0.0) {
                return Err(Error::invalid_value(
                    "remote.requests_per_second",
                    "must be a positive number",
                ));
            }
        }
        self.business_rules.validate()
    }

    /// Contract for a table, if one is declared
    pub fn schema(&self, table: &str) -> Option<&SchemaContract> {
        self.extractions.schemas.get(table)
    }

    /// Name of the column holding each row's date
    pub fn temporal_column(&self) -> &str {
        &self.extractions.temporal_column
    }

    /// Tables in processing order
    pub fn tables(&self) -> &[String] {
        &self.extractions.tables
    }

    /// Directory for the reports of one phase, e.g. `phase_01`
    pub fn reports_dir(&self, phase_dir: &str) -> PathBuf {
        self.general.outputs_path.join("reports").join(phase_dir)
    }
}

// ============================================================================
// General
// ============================================================================

/// Local storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Raw snapshots (latest + history)
    pub data_raw_path: PathBuf,

    /// Cleansed tables and the master dataset
    pub data_cleansed_path: PathBuf,

    /// Reports root
    pub outputs_path: PathBuf,
}

// ============================================================================
// Remote
// ============================================================================

/// Remote data service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Service base URL (overridable from the command line)
    #[serde(default)]
    pub url: Option<String>,

    /// Service key (overridable from the command line)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Rows requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries for transient failures
    #[serde(default)]
    pub max_retries: u32,

    /// Optional client-side request rate cap
    #[serde(default)]
    pub requests_per_second: Option<f64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            max_retries: 0,
            requests_per_second: None,
        }
    }
}

fn default_page_size() -> usize {
    1000
}

fn default_timeout() -> u64 {
    30
}

// ============================================================================
// Extractions
// ============================================================================

/// Managed tables and their contracts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Column holding the temporal key
    #[serde(default = "default_temporal_column")]
    pub temporal_column: String,

    /// Tables in processing order
    pub tables: Vec<String>,

    /// Declared column types per table
    #[serde(default)]
    pub schemas: HashMap<String, SchemaContract>,

    /// Literals meaning "missing", by category
    #[serde(default)]
    pub sentinel_values: SentinelCatalog,
}

fn default_temporal_column() -> String {
    "date".to_string()
}

/// Ordered mapping of column name to declared type
///
/// The YAML mapping order is kept: it defines the column order of a pruned
/// table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaContract {
    columns: Vec<(String, ColumnType)>,
}

impl SchemaContract {
    pub fn new(columns: Vec<(String, ColumnType)>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    /// Declared column names in order
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of columns declared `int` or `float`
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, t)| t.is_numeric())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for SchemaContract {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, column_type) in &self.columns {
            map.serialize_entry(name, column_type)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SchemaContract {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ContractVisitor;

        impl<'de> Visitor<'de> for ContractVisitor {
            type Value = SchemaContract;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of column name to type")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, column_type)) = access.next_entry::<String, ColumnType>()? {
                    columns.push((name, column_type));
                }
                Ok(SchemaContract { columns })
            }
        }

        deserializer.deserialize_map(ContractVisitor)
    }
}

/// Sentinel literals by category (`numeric`, `object`, `datetime`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentinelCatalog(BTreeMap<String, Vec<JsonValue>>);

impl SentinelCatalog {
    pub fn new(categories: BTreeMap<String, Vec<JsonValue>>) -> Self {
        Self(categories)
    }

    /// Literals of one category
    pub fn category(&self, name: &str) -> Vec<Cell> {
        self.0
            .get(name)
            .map(|values| values.iter().map(Cell::from_json).collect())
            .unwrap_or_default()
    }

    /// Every literal across all categories
    pub fn all_literals(&self) -> Vec<Cell> {
        self.0
            .values()
            .flatten()
            .map(Cell::from_json)
            .filter(|c| !c.is_null())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

// ============================================================================
// Business Rules
// ============================================================================

/// Domain calendar parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessRules {
    /// Day-of-month ranges when customers get paid
    #[serde(default)]
    pub payment_cycles: Vec<PaymentCycle>,

    /// Recurring seasonal event windows
    #[serde(default)]
    pub seasonal_events: Vec<SeasonalEvent>,

    /// When bonus units are expected to match paid units
    #[serde(default)]
    pub promotion_season: PromotionSeason,
}

impl BusinessRules {
    pub fn validate(&self) -> Result<()> {
        for cycle in &self.payment_cycles {
            if !(1..=31).contains(&cycle.start_day)
                || !(1..=31).contains(&cycle.end_day)
                || cycle.start_day > cycle.end_day
            {
                return Err(Error::invalid_value(
                    format!("business_rules.payment_cycles.{}", cycle.name),
                    format!(
                        "day range {}..{} must be ordered and within 1..31",
                        cycle.start_day, cycle.end_day
                    ),
                ));
            }
        }
        for event in &self.seasonal_events {
            if event.start().is_none() || event.end().is_none() || event.start() > event.end() {
                return Err(Error::invalid_value(
                    format!("business_rules.seasonal_events.{}", event.name),
                    "window must be a valid, ordered calendar range",
                ));
            }
        }
        if let Some(month) = self
            .promotion_season
            .months
            .iter()
            .find(|m| !(1..=12).contains(*m))
        {
            return Err(Error::invalid_value(
                "business_rules.promotion_season.months",
                format!("{month} is not a calendar month"),
            ));
        }
        Ok(())
    }
}

/// A payment cycle such as a mid-month or end-of-month payday window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCycle {
    pub name: String,
    pub start_day: u32,
    pub end_day: u32,
}

/// A yearly event window given as month/day bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalEvent {
    pub name: String,
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
}

impl SeasonalEvent {
    // Leap year so Feb 29 windows validate.
    fn start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2000, self.start_month, self.start_day)
    }

    fn end(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2000, self.end_month, self.end_day)
    }
}

/// Months (from a starting year) in which every bonus unit mirrors a paid one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionSeason {
    #[serde(default = "default_promotion_months")]
    pub months: Vec<u32>,

    #[serde(default = "default_promotion_since")]
    pub since_year: i32,
}

impl Default for PromotionSeason {
    fn default() -> Self {
        Self {
            months: default_promotion_months(),
            since_year: default_promotion_since(),
        }
    }
}

impl PromotionSeason {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() >= self.since_year && self.months.contains(&date.month())
    }
}

fn default_promotion_months() -> Vec<u32> {
    vec![4, 5, 9, 10]
}

fn default_promotion_since() -> i32 {
    2022
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"
general:
  data_raw_path: data/raw
  data_cleansed_path: data/cleansed
  outputs_path: outputs
extractions:
  tables: [sales, inventory]
  schemas:
    sales:
      date: datetime
      total_units: int
      paid_units: int
      bonus_units: int
      is_promotion: int
  sentinel_values:
    numeric: [-999, -1.0]
    object: ["N/A", ""]
    datetime: ["1900-01-01"]
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = PipelineConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.tables(), ["sales", "inventory"]);
        assert_eq!(config.temporal_column(), "date");
        assert_eq!(config.remote.page_size, 1000);
        assert_eq!(config.remote.max_retries, 0);
        assert_eq!(
            config.reports_dir("phase_01"),
            PathBuf::from("outputs/reports/phase_01")
        );
    }

    #[test]
    fn test_schema_preserves_declared_order() {
        let config = PipelineConfig::from_yaml_str(MINIMAL).unwrap();
        let schema = config.schema("sales").unwrap();
        assert_eq!(
            schema.names(),
            vec!["date", "total_units", "paid_units", "bonus_units", "is_promotion"]
        );
        assert_eq!(schema.get("date"), Some(ColumnType::Date));
        assert_eq!(schema.numeric_columns().len(), 4);
        assert!(config.schema("weather").is_none());
    }

    #[test]
    fn test_sentinel_catalog() {
        let config = PipelineConfig::from_yaml_str(MINIMAL).unwrap();
        let catalog = &config.extractions.sentinel_values;
        assert_eq!(catalog.category("numeric"), vec![Cell::Int(-999), Cell::Float(-1.0)]);
        assert_eq!(catalog.all_literals().len(), 5);
        assert!(catalog.category("unknown").is_empty());
    }

    #[test]
    fn test_rejects_empty_tables() {
        let yaml = MINIMAL.replace("tables: [sales, inventory]", "tables: []");
        let err = PipelineConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let yaml = format!("{MINIMAL}remote:\n  page_size: 0\n");
        assert!(PipelineConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_business_rules_validation() {
        let yaml = format!(
            "{MINIMAL}business_rules:\n  payment_cycles:\n    - {{name: mid_month, start_day: 20, end_day: 14}}\n"
        );
        assert!(PipelineConfig::from_yaml_str(&yaml).is_err());

        let yaml = format!(
            "{MINIMAL}business_rules:\n  seasonal_events:\n    - {{name: fair, start_month: 8, start_day: 1, end_month: 8, end_day: 32}}\n"
        );
        assert!(PipelineConfig::from_yaml_str(&yaml).is_err());

        let yaml = format!("{MINIMAL}business_rules:\n  promotion_season:\n    months: [13]\n");
        assert!(PipelineConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_promotion_season_window() {
        let season = PromotionSeason::default();
        assert!(season.contains(NaiveDate::from_ymd_opt(2022, 4, 1).unwrap()));
        assert!(!season.contains(NaiveDate::from_ymd_opt(2021, 4, 1).unwrap()));
        assert!(!season.contains(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()));
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineConfig::from_file("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
