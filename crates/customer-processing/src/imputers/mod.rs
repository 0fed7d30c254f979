//! Imputation module for handling missing values.
//!
//! Provides deterministic mode imputation over canonical columns.

mod statistical;

pub use statistical::StatisticalImputer;
