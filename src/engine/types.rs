//! Phase report types

use crate::audit::{AuditReport, Preview, Shape};
use crate::cleanse::{CleansingLog, Stage};
use crate::error::{Error, ErrorKind};
use crate::master::MasterAudit;
use crate::types::TableStatus;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Report name of the extraction phase
pub const EXTRACTION_REPORT: &str = "phase_01_extractions";

/// Report name of the preprocessing phase
pub const PREPROCESSING_REPORT: &str = "phase_02_preprocessing";

// ============================================================================
// Per-Table Results
// ============================================================================

/// Per-table entries in configured order, serialized as a JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct TableResults<T>(Vec<(String, T)>);

impl<T> TableResults<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, table: impl Into<String>, result: T) {
        self.0.push((table.into(), result));
    }

    pub fn get(&self, table: &str) -> Option<&T> {
        self.0.iter().find(|(name, _)| name == table).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(name, r)| (name.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for TableResults<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize> Serialize for TableResults<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, result) in &self.0 {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

// ============================================================================
// Extraction Report
// ============================================================================

/// Outcome of extracting and auditing one table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableAudit {
    Success {
        audit_details: Box<AuditReport>,
        preview: Preview,
    },
    Error {
        error_kind: ErrorKind,
        error_message: String,
    },
}

impl TableAudit {
    pub fn failed(error: &Error) -> Self {
        Self::Error {
            error_kind: error.kind(),
            error_message: error.to_string(),
        }
    }

    pub fn status(&self) -> TableStatus {
        match self {
            Self::Success { .. } => TableStatus::Success,
            Self::Error { .. } => TableStatus::Error,
        }
    }
}

/// Run summary counters of the extraction phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionMetrics {
    pub total_tables_processed: usize,
    pub successful_extractions: usize,
    pub failed_extractions: usize,
    /// Rows received from the remote service, before merging
    pub total_rows_extracted: usize,
    pub incremental_updates: usize,
    pub full_extractions: usize,
}

impl ExtractionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, rows: usize) {
        self.successful_extractions += 1;
        self.total_rows_extracted += rows;
    }

    pub fn add_failure(&mut self) {
        self.failed_extractions += 1;
    }
}

/// Consolidated report of one extraction run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub phase: &'static str,
    pub timestamp: String,
    pub description: &'static str,
    pub metrics: ExtractionMetrics,
    pub table_audits: TableResults<TableAudit>,
}

// ============================================================================
// Preprocessing Report
// ============================================================================

/// Outcome of cleansing one table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableReport {
    Success {
        initial_shape: Shape,
        final_shape: Shape,
        audit_log: CleansingLog,
    },
    Error {
        error_kind: ErrorKind,
        error_message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        failed_stage: Option<Stage>,
        #[serde(skip_serializing_if = "Option::is_none")]
        audit_log: Option<CleansingLog>,
    },
}

impl TableReport {
    /// A failure that happened before cleansing started
    pub fn failed(error: &Error) -> Self {
        Self::Error {
            error_kind: error.kind(),
            error_message: error.to_string(),
            failed_stage: None,
            audit_log: None,
        }
    }

    pub fn status(&self) -> TableStatus {
        match self {
            Self::Success { .. } => TableStatus::Success,
            Self::Error { .. } => TableStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == TableStatus::Success
    }
}

/// The master dataset's audit, or why it could not be built
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MasterOutcome {
    Built(MasterAudit),
    Failed { status: TableStatus, message: String },
}

impl MasterOutcome {
    pub fn failed(error: &Error) -> Self {
        Self::Failed {
            status: TableStatus::Error,
            message: error.to_string(),
        }
    }

    pub fn audit(&self) -> Option<&MasterAudit> {
        match self {
            Self::Built(audit) => Some(audit),
            Self::Failed { .. } => None,
        }
    }
}

/// Consolidated report of one preprocessing run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessingReport {
    pub phase: &'static str,
    pub timestamp: String,
    pub description: &'static str,
    pub table_reports: TableResults<TableReport>,
    pub master_audit: MasterOutcome,
}

impl PreprocessingReport {
    pub fn successful_tables(&self) -> impl Iterator<Item = &str> {
        self.table_reports
            .iter()
            .filter(|(_, report)| report.is_success())
            .map(|(name, _)| name)
    }
}
