//! Cleansing stages and the per-table log

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Stage a table has reached in the cleansing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Raw,
    SentinelNulled,
    DedupedExact,
    ContractPruned,
    DateDeduped,
    RuleCorrected,
    ReindexedContinuous,
    Imputed,
    Clean,
}

impl Stage {
    /// The stage that follows this one
    pub fn next(self) -> Stage {
        match self {
            Stage::Raw => Stage::SentinelNulled,
            Stage::SentinelNulled => Stage::DedupedExact,
            Stage::DedupedExact => Stage::ContractPruned,
            Stage::ContractPruned => Stage::DateDeduped,
            Stage::DateDeduped => Stage::RuleCorrected,
            Stage::RuleCorrected => Stage::ReindexedContinuous,
            Stage::ReindexedContinuous => Stage::Imputed,
            Stage::Imputed | Stage::Clean => Stage::Clean,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Raw => "RAW",
            Stage::SentinelNulled => "SENTINEL_NULLED",
            Stage::DedupedExact => "DEDUPED_EXACT",
            Stage::ContractPruned => "CONTRACT_PRUNED",
            Stage::DateDeduped => "DATE_DEDUPED",
            Stage::RuleCorrected => "RULE_CORRECTED",
            Stage::ReindexedContinuous => "REINDEXED_CONTINUOUS",
            Stage::Imputed => "IMPUTED",
            Stage::Clean => "CLEAN",
        };
        f.write_str(name)
    }
}

/// What cleansing did to one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleansingLog {
    pub initial_rows: usize,
    pub sentinels_nulled: usize,
    pub exact_duplicates_removed: usize,
    pub removed_columns: Vec<String>,
    pub null_dates_dropped: usize,
    pub duplicate_dates_removed: usize,
    /// Rows altered, per correction
    pub corrections: BTreeMap<String, usize>,
    /// Cells filled or recomputed, per imputation
    pub imputations: BTreeMap<String, usize>,
    pub skipped_steps: Vec<String>,
    /// Calendar rows inserted by reindexing
    pub gaps_filled: usize,
    pub total_days_final: usize,
    pub final_null_count: usize,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CleansingLog {
    pub(crate) fn new(initial_rows: usize) -> Self {
        Self {
            initial_rows,
            ..Self::default()
        }
    }

    pub(crate) fn advance(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn skip(&mut self, step: impl fmt::Display, missing: &[String]) {
        self.skipped_steps
            .push(format!("{step} (missing: {})", missing.join(", ")));
    }
}
