//! Report generation module.
//!
//! Exports the cleaned table (CSV) and the query results (JSON) for the
//! external plotting side.
//!
//! # Example
//!
//! ```rust,ignore
//! use customer_processing::reporting::ReportGenerator;
//!
//! let generator = ReportGenerator::from_config(&config);
//! let csv_path = generator.write_cleaned_table(&outcome.table)?;
//! let report = ReportGenerator::build_report(
//!     "data/customers.csv",
//!     Some(&csv_path),
//!     &outcome.summary,
//!     &queries,
//! );
//! generator.write_report(&report)?;
//! ```

mod generator;

pub use generator::{AnalysisReport, ReportGenerator};
