//! Common types used throughout dailyset
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Sync Mode
// ============================================================================

/// How a table was extracted on a given run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// No usable local snapshot, the whole remote table was requested
    #[default]
    FullRefresh,
    /// Only rows beyond the local cursor were requested
    Incremental,
}

// ============================================================================
// Table Status
// ============================================================================

/// Outcome of processing one table in a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Success,
    Error,
}

// ============================================================================
// Declared Column Type
// ============================================================================

/// Primitive type a schema contract declares for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "integer", alias = "int64")]
    Int,
    #[serde(alias = "double", alias = "float64")]
    Float,
    #[serde(alias = "datetime", alias = "timestamp")]
    Date,
    #[serde(alias = "str", alias = "string", alias = "object")]
    Text,
    #[serde(alias = "boolean")]
    Bool,
}

impl ColumnType {
    /// Whether values of this type take part in numeric profiling and rules
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "int"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Bool => write!(f, "bool"),
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utility Extensions
// ============================================================================

/// Extension trait for Option<String>
pub trait OptionStringExt {
    /// Return None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}
