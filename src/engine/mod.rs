//! Phase orchestration
//!
//! Two run loops drive the pipeline, each walking the configured tables in
//! order and one at a time:
//!
//! - [`ExtractionPhase`] fetches new rows, merges them into the raw
//!   snapshots and audits each result.
//! - [`PreprocessingPhase`] cleanses every raw snapshot and joins the
//!   successes into the master dataset.
//!
//! A table's failure is recorded in the phase report and never stops the
//! loop. The only error a phase returns is failing to write its report.

mod types;

pub use types::{
    ExtractionMetrics, ExtractionReport, MasterOutcome, PreprocessingReport, TableAudit,
    TableReport, TableResults, EXTRACTION_REPORT, PREPROCESSING_REPORT,
};

use crate::audit::{preview, ContractAuditor, Shape};
use crate::cleanse::CleansingEngine;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::extract::{IncrementalFetcher, MergeOutcome, SnapshotMerger};
use crate::frame::Frame;
use crate::master::{MasterMerger, MASTER_FILE_NAME};
use crate::output::{read_frame, snapshot_cursor, write_frame, ReportSink, SnapshotStore};
use crate::remote::RemoteTableClient;
use crate::types::SyncMode;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

const EXTRACTION_PHASE: &str = "01_extractions";
const EXTRACTION_DESCRIPTION: &str =
    "Consolidated report of incremental extraction and data auditing";
const PREPROCESSING_PHASE: &str = "02_preprocessing";
const PREPROCESSING_DESCRIPTION: &str =
    "Integrity cleansing, deduplication and continuous daily reindexing";

fn now_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

// ============================================================================
// Extraction
// ============================================================================

/// What happened to one table's snapshot during extraction
struct Extracted {
    snapshot: Frame,
    fetched: usize,
}

/// Extraction run loop: fetch, merge, persist, audit
pub struct ExtractionPhase<'a, C: RemoteTableClient + ?Sized> {
    config: &'a PipelineConfig,
    client: &'a C,
    store: SnapshotStore,
}

impl<'a, C: RemoteTableClient + ?Sized> ExtractionPhase<'a, C> {
    pub fn new(config: &'a PipelineConfig, client: &'a C) -> Self {
        Self {
            config,
            client,
            store: SnapshotStore::new(&config.general.data_raw_path),
        }
    }

    /// Where the phase report is written
    pub fn report_sink(&self) -> ReportSink {
        ReportSink::new(self.config.reports_dir("phase_01"))
    }

    /// Process every configured table and save the phase report
    pub async fn run(&self) -> Result<ExtractionReport> {
        let start = Instant::now();
        let tables = self.config.tables();
        info!(tables = tables.len(), "Starting extraction");

        let auditor = ContractAuditor::new(self.config);
        let mut metrics = ExtractionMetrics::new();
        let mut table_audits = TableResults::new();

        for table in tables {
            metrics.total_tables_processed += 1;
            let outcome = self.extract_table(table, &mut metrics).await;

            let audit = match outcome {
                Ok(extracted) => {
                    metrics.add_success(extracted.fetched);
                    let details = auditor.audit(&extracted.snapshot, table);
                    TableAudit::Success {
                        audit_details: Box::new(details),
                        preview: preview(&extracted.snapshot),
                    }
                }
                Err(e) => {
                    error!(table = %table, kind = ?e.kind(), error = %e, "Extraction failed");
                    metrics.add_failure();
                    TableAudit::failed(&e)
                }
            };
            table_audits.insert(table.clone(), audit);
        }

        let report = ExtractionReport {
            phase: EXTRACTION_PHASE,
            timestamp: now_timestamp(),
            description: EXTRACTION_DESCRIPTION,
            metrics,
            table_audits,
        };
        self.report_sink().save(EXTRACTION_REPORT, &report)?;

        info!(
            succeeded = metrics.successful_extractions,
            failed = metrics.failed_extractions,
            rows = metrics.total_rows_extracted,
            elapsed_ms = start.elapsed().as_millis(),
            "Extraction complete"
        );
        Ok(report)
    }

    async fn extract_table(
        &self,
        table: &str,
        metrics: &mut ExtractionMetrics,
    ) -> Result<Extracted> {
        let temporal_column = self.config.temporal_column();
        let existing = self.store.load(table)?;
        let cursor = existing
            .as_ref()
            .and_then(|frame| snapshot_cursor(frame, temporal_column));

        let fetcher = IncrementalFetcher::new(
            self.client,
            self.config.remote.page_size,
            temporal_column,
        );
        let fetched = fetcher.fetch_new_rows(table, cursor).await?;
        match fetched.mode {
            SyncMode::Incremental => metrics.incremental_updates += 1,
            SyncMode::FullRefresh => metrics.full_extractions += 1,
        }

        let incoming = fetcher.to_frame(&fetched.rows);
        let merger = SnapshotMerger::new(temporal_column);
        let snapshot = match merger.merge(existing.as_ref(), &incoming) {
            MergeOutcome::Unchanged => {
                info!(table, "No new rows, snapshot left untouched");
                existing.unwrap_or_default()
            }
            MergeOutcome::Merged {
                frame,
                added,
                replaced,
            } => {
                self.store.save(table, &frame)?;
                info!(table, added, replaced, rows = frame.num_rows(), "Snapshot updated");
                frame
            }
        };

        Ok(Extracted {
            snapshot,
            fetched: fetched.rows.len(),
        })
    }
}

// ============================================================================
// Preprocessing
// ============================================================================

/// Preprocessing run loop: cleanse each table, then build the master dataset
pub struct PreprocessingPhase<'a> {
    config: &'a PipelineConfig,
    store: SnapshotStore,
}

impl<'a> PreprocessingPhase<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            store: SnapshotStore::new(&config.general.data_raw_path),
        }
    }

    pub fn report_sink(&self) -> ReportSink {
        ReportSink::new(self.config.reports_dir("phase_02"))
    }

    /// Path of a table's cleansed output
    pub fn cleansed_path(&self, table: &str) -> PathBuf {
        self.config
            .general
            .data_cleansed_path
            .join(format!("{table}.parquet"))
    }

    pub fn master_path(&self) -> PathBuf {
        self.config.general.data_cleansed_path.join(MASTER_FILE_NAME)
    }

    /// Cleanse every configured table, merge, and save the phase report
    pub fn run(&self) -> Result<PreprocessingReport> {
        let start = Instant::now();
        info!(tables = self.config.tables().len(), "Starting preprocessing");

        let engine = CleansingEngine::new(self.config);
        let mut table_reports = TableResults::new();
        for table in self.config.tables() {
            let report = self.preprocess_table(&engine, table);
            table_reports.insert(table.clone(), report);
        }

        let master_audit = match self.build_master(&table_reports) {
            Ok(audit) => audit,
            Err(e) => {
                error!(error = %e, "Master merge failed");
                MasterOutcome::failed(&e)
            }
        };

        let report = PreprocessingReport {
            phase: PREPROCESSING_PHASE,
            timestamp: now_timestamp(),
            description: PREPROCESSING_DESCRIPTION,
            table_reports,
            master_audit,
        };
        self.report_sink().save(PREPROCESSING_REPORT, &report)?;

        info!(
            succeeded = report.successful_tables().count(),
            elapsed_ms = start.elapsed().as_millis(),
            "Preprocessing complete"
        );
        Ok(report)
    }

    fn preprocess_table(&self, engine: &CleansingEngine<'_>, table: &str) -> TableReport {
        let raw = match self.store.load(table) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                let path = self.store.latest_path(table);
                warn!(table, path = %path.display(), "Raw snapshot not found");
                return TableReport::failed(&Error::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                error!(table, error = %e, "Raw snapshot unreadable");
                return TableReport::failed(&e);
            }
        };
        let initial_shape = Shape::of(&raw);

        let cleansed = match engine.clean(raw, table) {
            Ok(cleansed) => cleansed,
            Err(failure) => {
                return TableReport::Error {
                    error_kind: failure.error.kind(),
                    error_message: failure.error.to_string(),
                    failed_stage: Some(failure.failed_stage),
                    audit_log: Some(failure.log),
                };
            }
        };

        if let Err(e) = self.save_cleansed(table, &cleansed.frame) {
            error!(table, error = %e, "Cleansed table could not be written");
            return TableReport::failed(&e);
        }

        info!(table, "Table preprocessed");
        TableReport::Success {
            initial_shape,
            final_shape: Shape::of(&cleansed.frame),
            audit_log: cleansed.log,
        }
    }

    fn save_cleansed(&self, table: &str, frame: &Frame) -> Result<usize> {
        std::fs::create_dir_all(&self.config.general.data_cleansed_path)?;
        write_frame(self.cleansed_path(table), frame, None)
    }

    /// Join the cleansed outputs of the successful tables, as written
    fn build_master(&self, table_reports: &TableResults<TableReport>) -> Result<MasterOutcome> {
        let mut frames = Vec::new();
        for (table, report) in table_reports.iter() {
            if report.is_success() {
                let (frame, _) = read_frame(self.cleansed_path(table))?;
                frames.push((table.to_string(), frame));
            }
        }

        let master = MasterMerger::new(self.config).merge_all(&frames)?;
        master.save(self.master_path())?;
        Ok(MasterOutcome::Built(master.audit()))
    }
}
