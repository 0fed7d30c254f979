use crate::config::{AnalysisConfig, DEFAULT_OUTPUT_NAME};
use crate::error::{Result, ResultExt};
use crate::queries::QuerySetReport;
use crate::types::{CleanedTable, CleaningSummary};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything one run produced, in a form the plotting side can consume.
///
/// Used for both JSON output to stdout (`--json`) and the report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the exported cleaned table (if written)
    pub cleaned_table_file: Option<String>,
    pub cleaning: CleaningSummary,
    pub queries: QuerySetReport,
}

/// Writes the cleaned table and query results to the output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.output_dir.clone(), config.output_name.clone())
    }

    fn base_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME)
    }

    /// Where [`write_cleaned_table`](Self::write_cleaned_table) writes.
    pub fn cleaned_table_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_cleaned.csv", self.base_name()))
    }

    /// Where [`write_report`](Self::write_report) writes.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_report.json", self.base_name()))
    }

    /// Export the cleaned table as CSV.
    pub fn write_cleaned_table(&self, table: &CleanedTable) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let output_path = self.cleaned_table_path();
        let mut file = File::create(&output_path)?;
        let mut df = table.df().clone();

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut df)
            .context(format!("Failed to write {}", output_path.display()))?;

        info!("Cleaned table saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Assemble a report from a run's results.
    pub fn build_report(
        input_file: &str,
        cleaned_table_file: Option<&Path>,
        cleaning: &CleaningSummary,
        queries: &QuerySetReport,
    ) -> AnalysisReport {
        AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            cleaned_table_file: cleaned_table_file.map(|p| p.display().to_string()),
            cleaning: cleaning.clone(),
            queries: queries.clone(),
        }
    }

    /// Write the report as pretty JSON.
    pub fn write_report(&self, report: &AnalysisReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.report_path();
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}
