//! Table cleansing
//!
//! Turns a raw snapshot into a clean daily series. Each table walks the same
//! stages in order:
//!
//! ```text
//! RAW → SENTINEL_NULLED → DEDUPED_EXACT → CONTRACT_PRUNED → DATE_DEDUPED
//!     → RULE_CORRECTED → REINDEXED_CONTINUOUS → IMPUTED → CLEAN
//! ```
//!
//! Corrections and imputations come from a per-table registry of typed
//! steps (see [`Correction`] and [`Imputation`]). A failure stops that table
//! only and reports the stage it failed in.

mod log;
mod reindex;
mod steps;

pub use log::{CleansingLog, Stage};
pub use reindex::{reindex_daily, Reindexed};
pub use steps::{Correction, Imputation};

use crate::config::PipelineConfig;
use crate::domain::TableKind;
use crate::error::{Error, Result};
use crate::frame::{parse_date, Cell, Frame};
use std::fmt;
use steps::{Requirement, StepContext};
use tracing::{debug, info, warn};

/// A cleansed table and the log of how it got there
#[derive(Debug, Clone, PartialEq)]
pub struct Cleansed {
    pub frame: Frame,
    pub log: CleansingLog,
}

/// A table whose cleansing stopped part way
#[derive(Debug)]
pub struct CleansingFailure {
    /// Stage being attempted when the error occurred
    pub failed_stage: Stage,
    /// Progress up to the failure
    pub log: CleansingLog,
    pub error: Error,
}

impl fmt::Display for CleansingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.error, self.failed_stage)
    }
}

impl std::error::Error for CleansingFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Applies the cleansing stages to one table at a time
#[derive(Debug, Clone)]
pub struct CleansingEngine<'a> {
    config: &'a PipelineConfig,
}

impl<'a> CleansingEngine<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Cleanse one table
    ///
    /// A table with no domain rules passes through unmodified with a warning
    /// in its log.
    pub fn clean(
        &self,
        frame: Frame,
        table: &str,
    ) -> std::result::Result<Cleansed, CleansingFailure> {
        let mut log = CleansingLog::new(frame.num_rows());

        let Some(kind) = TableKind::from_name(table) else {
            warn!(table, "No cleansing rules for table, passing through");
            log.warning = Some(format!(
                "table '{table}' has no cleansing rules; passed through unmodified"
            ));
            log.final_null_count = frame.null_count();
            log.total_days_final = frame.num_rows();
            log.advance(Stage::Clean);
            return Ok(Cleansed { frame, log });
        };

        match self.run_stages(frame, kind, table, &mut log) {
            Ok(frame) => {
                log.final_null_count = frame.null_count();
                log.advance(Stage::Clean);
                info!(
                    table,
                    rows = frame.num_rows(),
                    gaps_filled = log.gaps_filled,
                    nulls = log.final_null_count,
                    "Table cleansed"
                );
                Ok(Cleansed { frame, log })
            }
            Err(error) => {
                let failed_stage = log.stage.next();
                warn!(table, stage = %failed_stage, error = %error, "Cleansing failed");
                Err(CleansingFailure {
                    failed_stage,
                    log,
                    error,
                })
            }
        }
    }

    fn run_stages(
        &self,
        mut frame: Frame,
        kind: TableKind,
        table: &str,
        log: &mut CleansingLog,
    ) -> Result<Frame> {
        log.sentinels_nulled = self.null_sentinels(&mut frame);
        log.advance(Stage::SentinelNulled);

        log.exact_duplicates_removed = frame.drop_duplicate_rows();
        log.advance(Stage::DedupedExact);

        frame = self.prune_to_contract(frame, table, log);
        log.advance(Stage::ContractPruned);

        let temporal_column = self.config.temporal_column();
        let date_idx = frame.column_index(temporal_column).ok_or_else(|| {
            Error::missing_columns(table, "date_dedup", vec![temporal_column.to_string()])
        })?;
        dedup_dates(&mut frame, date_idx, table, temporal_column, log)?;
        log.advance(Stage::DateDeduped);

        let ctx = StepContext {
            table,
            temporal_column,
            rules: &self.config.business_rules,
        };
        for correction in Correction::registry(kind) {
            match Requirement::check(&frame, correction.required_columns()) {
                Requirement::Ready => {
                    let altered = correction.apply(&mut frame, &ctx)?;
                    debug!(table, step = %correction, altered, "Correction applied");
                    log.corrections.insert(correction.name().to_string(), altered);
                }
                Requirement::Absent(missing) => log.skip(correction, &missing),
                Requirement::Partial(missing) => {
                    return Err(Error::missing_columns(table, correction.name(), missing));
                }
            }
        }
        log.advance(Stage::RuleCorrected);

        let reindexed = reindex_daily(&frame, date_idx);
        frame = reindexed.frame;
        log.gaps_filled = reindexed.inserted;
        log.total_days_final = frame.num_rows();
        log.advance(Stage::ReindexedContinuous);

        for imputation in Imputation::registry(kind) {
            match Requirement::check(&frame, imputation.required_columns()) {
                Requirement::Ready => {
                    let changed = imputation.apply(&mut frame, &ctx)?;
                    debug!(table, step = %imputation, changed, "Imputation applied");
                    log.imputations.insert(imputation.name(), changed);
                }
                Requirement::Absent(missing) | Requirement::Partial(missing) => {
                    log.skip(imputation, &missing);
                }
            }
        }
        log.advance(Stage::Imputed);

        Ok(frame)
    }

    /// Null every cell equal to any configured sentinel, whatever its column
    ///
    /// The catalog is applied as one flat list, so a literal listed under one
    /// category also matches cells of other kinds.
    fn null_sentinels(&self, frame: &mut Frame) -> usize {
        let literals = self.config.extractions.sentinel_values.all_literals();
        if literals.is_empty() {
            return 0;
        }
        let mut nulled = 0;
        for row in frame.rows_mut() {
            for cell in row.iter_mut() {
                if literals.iter().any(|lit| cell.matches_sentinel(lit)) {
                    *cell = Cell::Null;
                    nulled += 1;
                }
            }
        }
        nulled
    }

    /// Keep only declared columns, in declared order
    fn prune_to_contract(&self, frame: Frame, table: &str, log: &mut CleansingLog) -> Frame {
        let Some(schema) = self.config.schema(table) else {
            log.skipped_steps
                .push("contract_pruning (no schema declared)".to_string());
            return frame;
        };
        let declared = schema.names();
        for name in frame.columns() {
            if !declared.contains(name) && !log.removed_columns.contains(name) {
                log.removed_columns.push(name.clone());
            }
        }
        frame.select(&declared)
    }
}

/// Parse the temporal key, drop null keys, sort, and keep the last row per day
fn dedup_dates(
    frame: &mut Frame,
    date_idx: usize,
    table: &str,
    temporal_column: &str,
    log: &mut CleansingLog,
) -> Result<()> {
    for row in frame.rows_mut() {
        let parsed = match &row[date_idx] {
            Cell::Null | Cell::Date(_) => continue,
            Cell::Text(raw) => parse_date(raw),
            _ => None,
        };
        match parsed {
            Some(date) => row[date_idx] = Cell::Date(date),
            None => {
                return Err(Error::UnparseableTemporalKey {
                    table: table.to_string(),
                    column: temporal_column.to_string(),
                    value: row[date_idx].to_string(),
                });
            }
        }
    }

    log.null_dates_dropped = frame.retain_rows(|row| !row[date_idx].is_null());
    frame.sort_by_date(date_idx);
    log.duplicate_dates_removed = frame.dedup_by_column(date_idx);
    Ok(())
}
