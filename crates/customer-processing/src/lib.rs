//! Customer Dataset Cleaning and Analysis Library
//!
//! Cleans a raw customer table into a fixed canonical schema and answers a
//! fixed set of analytical questions over the result.
//!
//! # Overview
//!
//! - **Schema Normalization**: Raw headers are mapped onto eight canonical columns
//! - **Data Cleaning**: Duplicate removal, type coercion, case folding
//! - **Imputation**: Mode imputation of profession and age (with the `0` age sentinel)
//! - **Analytical Store**: The cleaned table is loaded into an in-memory SQLite database
//! - **Queries**: Four parameterless aggregate queries over the store
//! - **Progress Reporting**: Per-stage progress updates
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use customer_processing::{AnalyticalStore, Pipeline, run_all};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("customers.csv".into()))?
//!     .finish()?;
//!
//! let outcome = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()
//!     .process(df)?;
//!
//! let store = AnalyticalStore::load(&outcome.table)?;
//! let report = run_all(&store)?;
//!
//! println!("Single parents with high income: {}", report.single_parent_high_income.count);
//! ```
//!
//! If only the table is needed, [`clean`] runs the pipeline with no reporter.
//!
//! # Errors
//!
//! Every fallible operation returns [`PipelineError`]. A schema or data type
//! failure aborts the run; no partially cleaned table is ever returned.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod queries;
pub mod reporting;
pub mod schema;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{TypeCoercer, missing_value_counts};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{PipelineError, Result, ResultExt};
pub use imputers::StatisticalImputer;
pub use pipeline::{
    CleaningStage, ClosureProgressReporter, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate, clean,
};
pub use queries::{
    LawyerExperience, ProfessionSpending, QuerySetReport, SingleParentHighIncome, SpendingBand,
    SpendingBandCount, run_all, run_query_1, run_query_2, run_query_3, run_query_4,
};
pub use reporting::{AnalysisReport, ReportGenerator};
pub use schema::{CanonicalColumn, ColumnType, HeaderMapping, SchemaNormalizer};
pub use store::AnalyticalStore;
pub use types::{
    CleanedTable, CleaningOutcome, CleaningSummary, CustomerRecord, ImputationRecord, MissingCount,
};

static_assertions::assert_impl_all!(CleanedTable: Send, Sync);
static_assertions::assert_impl_all!(CleaningSummary: Send, Sync);
