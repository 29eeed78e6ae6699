//! Duplicate and calendar-gap checks

use crate::frame::Frame;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Missing calendar days, when they can be computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DateGaps {
    Counted {
        date_gaps_count: usize,
        date_gaps_sample: Vec<String>,
    },
    NotApplicable {
        date_gaps_count: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityChecks {
    pub duplicated_rows_count: usize,
    /// Absent when the table has no temporal column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicated_dates_count: Option<usize>,
    #[serde(flatten)]
    pub date_gaps: Option<DateGaps>,
}

const GAP_SAMPLE_SIZE: usize = 5;

/// Count duplicate rows and keys, and the days missing from the key range
///
/// Gap analysis only runs when every key parses as a date.
pub fn check_integrity(frame: &Frame, temporal_column: &str) -> IntegrityChecks {
    let duplicated_rows_count = frame.duplicate_row_count();

    let Some(idx) = frame.column_index(temporal_column) else {
        return IntegrityChecks {
            duplicated_rows_count,
            duplicated_dates_count: None,
            date_gaps: None,
        };
    };

    let keys: Vec<Option<NaiveDate>> = frame.column(idx).map(|c| c.as_date()).collect();
    let distinct: HashSet<&Option<NaiveDate>> = keys.iter().collect();
    let duplicated_dates_count = keys.len() - distinct.len();

    let date_gaps = if keys.iter().any(Option::is_none) {
        DateGaps::NotApplicable {
            date_gaps_count: "not applicable (unparseable or null dates present)".to_string(),
        }
    } else {
        let present: BTreeSet<NaiveDate> = keys.into_iter().flatten().collect();
        let missing = missing_days(&present);
        DateGaps::Counted {
            date_gaps_count: missing.len(),
            date_gaps_sample: missing
                .iter()
                .take(GAP_SAMPLE_SIZE)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
        }
    };

    IntegrityChecks {
        duplicated_rows_count,
        duplicated_dates_count: Some(duplicated_dates_count),
        date_gaps: Some(date_gaps),
    }
}

/// Days in `[min, max]` absent from `present`
pub fn missing_days(present: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    let (Some(&first), Some(&last)) = (present.first(), present.last()) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| !present.contains(d))
        .collect()
}
