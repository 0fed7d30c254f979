//! Configuration for a customer analysis run.
//!
//! Cleaning and the four queries are fixed; configuration only controls
//! where and whether results are exported.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default base name for exported files.
pub const DEFAULT_OUTPUT_NAME: &str = "customers";

/// Configuration for an analysis run.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use customer_processing::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .output_dir("reports")
///     .output_name("march_customers")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Output directory for the cleaned table and query results.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Base file name (without extension) for exports.
    /// If None, [`DEFAULT_OUTPUT_NAME`] is used.
    /// Default: None
    pub output_name: Option<String>,

    /// Whether to write anything to disk.
    /// Default: true
    pub save_to_disk: bool,

    /// Whether to export the cleaned table as CSV alongside the query results.
    /// Default: true
    pub export_cleaned_table: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            output_name: None,
            save_to_disk: true,
            export_cleaned_table: true,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Base name used for exported files.
    pub fn output_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(name) = &self.output_name {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyOutputName);
            }
            if name.contains(['/', '\\']) {
                return Err(ConfigValidationError::InvalidOutputName(name.clone()));
            }
        }

        if self.save_to_disk && self.output_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyOutputDir);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Output name cannot be empty")]
    EmptyOutputName,

    #[error("Invalid output name: {0:?} (must not contain path separators)")]
    InvalidOutputName(String),

    #[error("Output directory cannot be empty when saving to disk")]
    EmptyOutputDir,
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
    export_cleaned_table: Option<bool>,
}

impl AnalysisConfigBuilder {
    /// Set the output directory for exports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable saving results to disk.
    ///
    /// When false, results are only returned (and printed by the CLI).
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Enable or disable the cleaned-table CSV export.
    pub fn export_cleaned_table(mut self, export: bool) -> Self {
        self.export_cleaned_table = Some(export);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let config = AnalysisConfig {
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
            output_name: self.output_name,
            save_to_disk: self.save_to_disk.unwrap_or(true),
            export_cleaned_table: self.export_cleaned_table.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
