//! Statistical profile

use crate::config::SchemaContract;
use crate::frame::{Cell, ColumnKind, Frame};
use crate::types::ColumnType;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Tukey fence multiplier
const IQR_FENCE: f64 = 1.5;
const TOP_VALUES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IqrStats {
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub outliers_below: usize,
    pub outliers_above: usize,
    pub total_outliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericProfile {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent with fewer than two values
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub range: f64,
    pub iqr_stats: IqrStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalProfile {
    pub top_values: Vec<ValueCount>,
    pub unique_count: usize,
    pub mode: Option<String>,
    /// Share of all rows (nulls included) holding the mode
    pub top_weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticalProfile {
    pub numeric: BTreeMap<String, NumericProfile>,
    pub categorical: BTreeMap<String, CategoricalProfile>,
}

/// Profile numeric columns declared `int`/`float` and text columns
///
/// The temporal column is never profiled as categorical.
pub fn generate_profile(
    frame: &Frame,
    schema: Option<&SchemaContract>,
    temporal_column: &str,
) -> StatisticalProfile {
    let mut profile = StatisticalProfile::default();

    for (idx, name) in frame.columns().iter().enumerate() {
        let declared = schema.and_then(|s| s.get(name));
        let kind = frame.column_kind(idx);

        if declared.is_some_and(ColumnType::is_numeric) && kind.is_numeric() {
            let values: Vec<f64> = frame.column(idx).filter_map(Cell::as_f64).collect();
            if let Some(numeric) = numeric_profile(&values) {
                profile.numeric.insert(name.clone(), numeric);
            }
        } else if name != temporal_column
            && (declared == Some(ColumnType::Text)
                || matches!(kind, ColumnKind::Text | ColumnKind::Mixed))
        {
            profile
                .categorical
                .insert(name.clone(), categorical_profile(frame, idx));
        }
    }

    profile
}

#[allow(clippy::cast_precision_loss)]
fn numeric_profile(values: &[f64]) -> Option<NumericProfile> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.len() > 1).then(|| {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    });

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let p25 = quantile(&sorted, 0.25);
    let p75 = quantile(&sorted, 0.75);
    let iqr = p75 - p25;
    let lower_bound = p25 - IQR_FENCE * iqr;
    let upper_bound = p75 + IQR_FENCE * iqr;
    let outliers_below = values.iter().filter(|v| **v < lower_bound).count();
    let outliers_above = values.iter().filter(|v| **v > upper_bound).count();

    Some(NumericProfile {
        count: values.len(),
        mean,
        std,
        min,
        max,
        p25,
        p50: quantile(&sorted, 0.5),
        p75,
        range: max - min,
        iqr_stats: IqrStats {
            iqr,
            lower_bound,
            upper_bound,
            outliers_below,
            outliers_above,
            total_outliers: outliers_below + outliers_above,
        },
    })
}

/// Quantile of sorted values with linear interpolation between ranks
#[allow(clippy::cast_precision_loss)]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[allow(clippy::cast_precision_loss)]
fn categorical_profile(frame: &Frame, idx: usize) -> CategoricalProfile {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for cell in frame.column(idx).filter(|c| !c.is_null()) {
        let value = cell.to_string();
        let count = counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut ranked: Vec<ValueCount> = order
        .into_iter()
        .map(|value| {
            let count = counts[&value];
            ValueCount { value, count }
        })
        .collect();
    // stable: ties keep first-seen order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));

    let total = frame.num_rows();
    let top_weight = match (ranked.first(), total) {
        (Some(top), t) if t > 0 => top.count as f64 / t as f64,
        _ => 0.0,
    };

    CategoricalProfile {
        unique_count: ranked.len(),
        mode: ranked.first().map(|v| v.value.clone()),
        top_weight,
        top_values: ranked.into_iter().take(TOP_VALUES).collect(),
    }
}
