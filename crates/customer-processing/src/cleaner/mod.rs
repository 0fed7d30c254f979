//! Data cleaning building blocks for the customer table.
//!
//! This module provides:
//! - Exact-duplicate row removal
//! - Strict type coercion to the canonical schema
//! - Case normalization of categorical columns
//! - Age sentinel translation
//! - Missing-value census

mod sanitizers;
mod type_coercer;

pub use sanitizers::{
    lowercase_columns, missing_value_counts, remove_duplicates, translate_age_sentinel,
};
pub use type_coercer::TypeCoercer;
