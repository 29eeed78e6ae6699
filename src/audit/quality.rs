//! Null, sentinel, variance and cardinality metrics

use crate::config::SentinelCatalog;
use crate::frame::{ColumnKind, Frame};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityMetrics {
    pub null_counts: BTreeMap<String, usize>,
    /// Only columns with at least one sentinel hit
    pub sentinel_counts: BTreeMap<String, usize>,
    pub zero_variance_cols: Vec<String>,
    pub high_cardinality_cols: Vec<String>,
}

/// Rows needed before a text column can be called high-cardinality
const HIGH_CARDINALITY_MIN_ROWS: usize = 50;

/// Sentinel category for a column kind, if sentinels apply to it
fn sentinel_category(kind: ColumnKind) -> Option<&'static str> {
    match kind {
        ColumnKind::Int | ColumnKind::Float | ColumnKind::Bool => Some("numeric"),
        ColumnKind::Text | ColumnKind::Mixed => Some("object"),
        ColumnKind::Date => Some("datetime"),
        ColumnKind::Empty => None,
    }
}

/// Per-column quality metrics
///
/// Sentinel hits are counted against the catalog category matching each
/// column's apparent kind.
pub fn analyze_quality(frame: &Frame, catalog: &SentinelCatalog) -> QualityMetrics {
    let mut metrics = QualityMetrics {
        null_counts: BTreeMap::new(),
        sentinel_counts: BTreeMap::new(),
        zero_variance_cols: Vec::new(),
        high_cardinality_cols: Vec::new(),
    };
    let rows = frame.num_rows();

    for (idx, name) in frame.columns().iter().enumerate() {
        metrics
            .null_counts
            .insert(name.clone(), frame.column_null_count(idx));

        let kind = frame.column_kind(idx);
        if let Some(category) = sentinel_category(kind) {
            let literals = catalog.category(category);
            let hits = frame
                .column(idx)
                .filter(|cell| literals.iter().any(|lit| cell.matches_sentinel(lit)))
                .count();
            if hits > 0 {
                metrics.sentinel_counts.insert(name.clone(), hits);
            }
        }

        match kind {
            ColumnKind::Int | ColumnKind::Float | ColumnKind::Bool => {
                if frame.distinct_count(idx) <= 1 {
                    metrics.zero_variance_cols.push(name.clone());
                }
            }
            ColumnKind::Text | ColumnKind::Mixed => {
                #[allow(clippy::cast_precision_loss)]
                let unique_ratio = frame.distinct_count(idx) as f64 / rows as f64;
                if rows > HIGH_CARDINALITY_MIN_ROWS && unique_ratio > 0.5 {
                    metrics.high_cardinality_cols.push(name.clone());
                }
            }
            _ => {}
        }
    }

    metrics
}
