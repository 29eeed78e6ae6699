//! JSON report persistence
//!
//! A report is written twice: `{dir}/{name}_latest.json`, overwritten on
//! every run, and `{dir}/history/{name}_{timestamp}.json`, never touched
//! again.

use super::history_path;
use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths written by one report save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub latest: PathBuf,
    pub history: PathBuf,
}

/// Dual-persistence writer for phase reports
#[derive(Debug, Clone)]
pub struct ReportSink {
    dir: PathBuf,
}

impl ReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn latest_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}_latest.json"))
    }

    /// Serialize `report` and write both copies
    pub fn save<T: Serialize>(&self, name: &str, report: &T) -> Result<SavedReport> {
        let history_dir = self.dir.join("history");
        std::fs::create_dir_all(&history_dir)?;

        let body = serde_json::to_string_pretty(report)?;

        let latest = self.latest_path(name);
        std::fs::write(&latest, &body)?;

        let history = history_path(&history_dir, name, REPORT_TIMESTAMP_FORMAT, "json");
        std::fs::write(&history, &body)?;

        info!(report = %latest.display(), "Report saved");
        Ok(SavedReport { latest, history })
    }
}
