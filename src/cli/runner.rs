//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::engine::{ExtractionPhase, ExtractionReport, PreprocessingPhase, PreprocessingReport};
use crate::error::{Error, Result, ResultExt};
use crate::remote::RestTableClient;
use crate::types::OptionStringExt;
use serde_json::{json, Value};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.command {
            Commands::Extract => {
                let config = self.load_config()?;
                let report = self.extract(&config).await?;
                self.check_extraction(&report)
            }
            Commands::Preprocess => {
                let config = self.load_config()?;
                let report = self.preprocess(&config)?;
                self.check_preprocessing(&report)
            }
            Commands::Run => {
                let config = self.load_config()?;
                let extraction = self.extract(&config).await?;
                let preprocessing = self.preprocess(&config)?;
                self.check_extraction(&extraction)?;
                self.check_preprocessing(&preprocessing)
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load the configuration file and apply command-line overrides
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::from_file(&self.cli.config)?;
        if let Some(url) = self.cli.url.clone().none_if_empty() {
            config.remote.url = Some(url);
        }
        if let Some(key) = self.cli.api_key.clone().none_if_empty() {
            config.remote.api_key = Some(key);
        }
        Ok(config)
    }

    fn remote_client(config: &PipelineConfig) -> Result<RestTableClient> {
        let url = config
            .remote
            .url
            .as_deref()
            .ok_or_else(|| Error::missing_field("remote.url (or --url / SUPABASE_URL)"))?;
        let key = config
            .remote
            .api_key
            .as_deref()
            .ok_or_else(|| Error::missing_field("remote.api_key (or --api-key / SUPABASE_KEY)"))?;
        RestTableClient::new(url, key, &config.remote)
            .with_context(|| format!("cannot build remote client for {url}"))
    }

    async fn extract(&self, config: &PipelineConfig) -> Result<ExtractionReport> {
        let client = Self::remote_client(config)?;
        let report = ExtractionPhase::new(config, &client).run().await?;

        let tables: Vec<Value> = report
            .table_audits
            .iter()
            .map(|(table, audit)| json!({"table": table, "status": audit.status()}))
            .collect();
        self.output_message(&json!({
            "type": "SUMMARY",
            "phase": report.phase,
            "metrics": report.metrics,
            "tables": tables,
        }));
        Ok(report)
    }

    fn preprocess(&self, config: &PipelineConfig) -> Result<PreprocessingReport> {
        let report = PreprocessingPhase::new(config).run()?;

        let tables: Vec<Value> = report
            .table_reports
            .iter()
            .map(|(table, r)| json!({"table": table, "status": r.status()}))
            .collect();
        self.output_message(&json!({
            "type": "SUMMARY",
            "phase": report.phase,
            "tables": tables,
            "master_rows": report.master_audit.audit().map(|a| a.total_rows),
        }));
        Ok(report)
    }

    fn check_extraction(&self, report: &ExtractionReport) -> Result<()> {
        let failed = report.metrics.failed_extractions;
        if self.cli.strict && failed > 0 {
            return Err(Error::Other(format!("{failed} table(s) failed extraction")));
        }
        Ok(())
    }

    fn check_preprocessing(&self, report: &PreprocessingReport) -> Result<()> {
        if !self.cli.strict {
            return Ok(());
        }
        let failed = report.table_reports.len() - report.successful_tables().count();
        if failed > 0 {
            return Err(Error::Other(format!("{failed} table(s) failed preprocessing")));
        }
        if report.master_audit.audit().is_none() {
            return Err(Error::Other("master dataset was not built".to_string()));
        }
        Ok(())
    }

    /// Validate the configuration file
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        info!(path = %self.cli.config.display(), "Configuration is valid");

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Configuration is valid with {} tables ({} with schema contracts)",
                    config.tables().len(),
                    config
                        .tables()
                        .iter()
                        .filter(|t| config.schema(t).is_some())
                        .count()
                )
            }
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"
general:
  data_raw_path: data/raw
  data_cleansed_path: data/cleansed
  outputs_path: outputs
remote:
  url: https://example.supabase.co
  api_key: from-file
extractions:
  tables: [sales]
"#;

    fn config_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_flags_override_config() {
        let file = config_file();
        let path = file.path().to_str().unwrap();
        let cli = Cli::parse_from([
            "dailyset",
            "--config",
            path,
            "--url",
            "http://localhost:54321",
            "--api-key",
            "from-flag",
            "validate",
        ]);

        let config = Runner::new(cli).load_config().unwrap();
        assert_eq!(config.remote.url.as_deref(), Some("http://localhost:54321"));
        assert_eq!(config.remote.api_key.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_empty_flag_keeps_file_value() {
        let file = config_file();
        let path = file.path().to_str().unwrap();
        let cli = Cli::parse_from(["dailyset", "-c", path, "--api-key", "", "validate"]);

        let config = Runner::new(cli).load_config().unwrap();
        assert_eq!(config.remote.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::parse_from(["dailyset", "--config", "/nonexistent/config.yaml", "validate"]);
        let err = Runner::new(cli).load_config().unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_remote_client_requires_url() {
        let mut config = PipelineConfig::from_yaml_str(CONFIG).unwrap();
        config.remote.url = None;
        assert!(Runner::remote_client(&config).is_err());
    }

    #[tokio::test]
    async fn test_validate_command() {
        let file = config_file();
        let cli = Cli::parse_from(["dailyset", "-c", file.path().to_str().unwrap(), "validate"]);
        Runner::new(cli).run().await.unwrap();
    }
}
