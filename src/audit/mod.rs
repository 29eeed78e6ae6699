//! Snapshot auditing
//!
//! Read-only analysis of one snapshot against its contract and the domain
//! rules. Each section runs on its own: a section that fails is recorded in
//! place as `{"error": ...}` and the others still run.
//!
//! # Overview
//!
//! - `validate_contract` - missing/extra columns and type mismatches
//! - `check_integrity` - duplicate rows, duplicate keys, calendar gaps
//! - `analyze_quality` - nulls, sentinels, variance and cardinality
//! - `generate_profile` - numeric and categorical statistics
//! - `validate_business_rules` - arithmetic identities between columns
//! - `preview` - first, last and sampled rows

mod contract;
mod integrity;
mod preview;
mod profile;
mod quality;
mod rules;

pub use contract::{validate_contract, ContractValidation, TypeMismatch};
pub use integrity::{check_integrity, missing_days, DateGaps, IntegrityChecks};
pub use preview::{preview, Preview};
pub use profile::{
    generate_profile, quantile, CategoricalProfile, IqrStats, NumericProfile, StatisticalProfile,
    ValueCount,
};
pub use quality::{analyze_quality, QualityMetrics};
pub use rules::{validate_business_rules, BusinessRuleValidation};

use crate::config::{PipelineConfig, SentinelCatalog};
use crate::error::Result;
use crate::frame::Frame;
use serde::Serialize;
use tracing::{debug, warn};

// ============================================================================
// Section
// ============================================================================

/// Outcome of one audit section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Completed(T),
    Failed { error: String },
}

impl<T> Section<T> {
    /// Record a section result, keeping a failure as its message
    pub fn from_result(name: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Section::Completed(value),
            Err(e) => {
                warn!(section = name, error = %e, "Audit section failed");
                Section::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// The section's value if it completed
    pub fn completed(&self) -> Option<&T> {
        match self {
            Section::Completed(value) => Some(value),
            Section::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed { .. })
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

impl Shape {
    pub fn of(frame: &Frame) -> Self {
        Self {
            rows: frame.num_rows(),
            columns: frame.num_columns(),
        }
    }
}

/// Everything the auditor found in one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub table_name: String,
    pub shape: Shape,
    pub contract_validation: Section<ContractValidation>,
    pub integrity_checks: Section<IntegrityChecks>,
    pub quality_metrics: Section<QualityMetrics>,
    pub statistical_profile: Section<StatisticalProfile>,
    pub business_rules_validation: Section<BusinessRuleValidation>,
}

impl AuditReport {
    /// Rule violations found, zero when the rule section failed
    pub fn violations_count(&self) -> usize {
        self.business_rules_validation
            .completed()
            .map_or(0, |rules| rules.violations_count)
    }
}

// ============================================================================
// Auditor
// ============================================================================

/// Audits snapshots against the configured contracts
#[derive(Debug, Clone)]
pub struct ContractAuditor<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ContractAuditor<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    fn sentinels(&self) -> &SentinelCatalog {
        &self.config.extractions.sentinel_values
    }

    /// Run every section over a snapshot
    pub fn audit(&self, frame: &Frame, table: &str) -> AuditReport {
        let schema = self.config.schema(table);
        let temporal_column = self.config.temporal_column();
        if schema.is_none() {
            debug!(table, "No schema contract declared");
        }

        let report = AuditReport {
            table_name: table.to_string(),
            shape: Shape::of(frame),
            contract_validation: Section::Completed(validate_contract(frame, schema)),
            integrity_checks: Section::Completed(check_integrity(frame, temporal_column)),
            quality_metrics: Section::Completed(analyze_quality(frame, self.sentinels())),
            statistical_profile: Section::Completed(generate_profile(
                frame,
                schema,
                temporal_column,
            )),
            business_rules_validation: Section::from_result(
                "business_rules_validation",
                validate_business_rules(frame, table, schema),
            ),
        };

        debug!(
            table,
            rows = report.shape.rows,
            violations = report.violations_count(),
            "Audit complete"
        );
        report
    }
}

#[cfg(test)]
mod tests;
