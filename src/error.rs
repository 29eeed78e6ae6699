//! Error types for dailyset
//!
//! This module defines the error hierarchy for the entire pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Contract and invariant violations are not errors: they are recorded in
//! audit reports and never surface as `Err`. Everything that does surface is
//! classified by [`ErrorKind`] so run loops can tag per-table failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for dailyset
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("No tables eligible for the master merge")]
    NoEligibleTables,

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Remote Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Fetch failed for table '{table}': {message}")]
    Connectivity { table: String, message: String },

    #[error("Unexpected response for table '{table}': {message}")]
    Query { table: String, message: String },

    // ============================================================================
    // Data Integrity Errors
    // ============================================================================
    #[error("Data integrity error in table '{table}': {message}")]
    DataIntegrity { table: String, message: String },

    #[error("Table '{table}' is missing columns required by '{step}': {}", columns.join(", "))]
    MissingColumns {
        table: String,
        step: String,
        columns: Vec<String>,
    },

    #[error("Table '{table}' has an unparseable value in temporal column '{column}': {value}")]
    UnparseableTemporalKey {
        table: String,
        column: String,
        value: String,
    },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Coarse classification used when a failure is recorded in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Remote fetch failed
    Connectivity,
    /// Missing branch columns or an unparseable temporal key
    DataIntegrity,
    /// Invalid configuration or nothing eligible to merge
    Configuration,
    /// Reading or writing local artifacts failed
    Persistence,
    /// Anything else
    Other,
}

impl Error {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Wrap a failed fetch for a table
    pub fn connectivity(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connectivity {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a query (unexpected response) error
    pub fn query(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a data integrity error
    pub fn integrity(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataIntegrity {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a missing columns error
    pub fn missing_columns(
        table: impl Into<String>,
        step: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self::MissingColumns {
            table: table.into(),
            step: step.into(),
            columns,
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::RateLimited { .. }
            | Error::Timeout { .. }
            | Error::Connectivity { .. }
            | Error::Query { .. } => ErrorKind::Connectivity,
            Error::DataIntegrity { .. }
            | Error::MissingColumns { .. }
            | Error::UnparseableTemporalKey { .. } => ErrorKind::DataIntegrity,
            Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::NoEligibleTables
            | Error::YamlParse(_)
            | Error::InvalidUrl(_) => ErrorKind::Configuration,
            Error::Arrow(_)
            | Error::Parquet(_)
            | Error::Output { .. }
            | Error::Io(_)
            | Error::FileNotFound { .. }
            | Error::JsonParse(_) => ErrorKind::Persistence,
            Error::Other(_) | Error::Anyhow(_) => ErrorKind::Other,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for dailyset
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_value("remote.page_size", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid config value for 'remote.page_size': must be positive"
        );

        let err = Error::missing_field("general.data_raw_path");
        assert_eq!(
            err.to_string(),
            "Missing required config field: general.data_raw_path"
        );

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::missing_columns(
            "inventory",
            "waste_balance",
            vec!["units_prepared".to_string(), "bonus_sales".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Table 'inventory' is missing columns required by 'waste_balance': units_prepared, bonus_sales"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::connectivity("sales", "refused").kind(),
            ErrorKind::Connectivity
        );
        assert_eq!(Error::http_status(500, "").kind(), ErrorKind::Connectivity);
        assert_eq!(
            Error::integrity("sales", "bad").kind(),
            ErrorKind::DataIntegrity
        );
        assert_eq!(
            Error::UnparseableTemporalKey {
                table: "sales".into(),
                column: "date".into(),
                value: "not-a-date".into(),
            }
            .kind(),
            ErrorKind::DataIntegrity
        );
        assert_eq!(Error::NoEligibleTables.kind(), ErrorKind::Configuration);
        assert_eq!(Error::output("disk").kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::DataIntegrity).unwrap();
        assert_eq!(json, "\"data_integrity\"");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_retryable());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::missing_field("remote.url").is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::missing_field("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Missing required config field: inner"));
    }
}
