//! Shared utilities for the customer cleaning pipeline.
//!
//! Helpers used by more than one stage: dtype checks, numeric string
//! parsing, deterministic mode computation and null filling.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// A number with comma thousands separators, e.g. `-1,234,567.89`.
static GROUPED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{1,3}(,\d{3})+(\.\d+)?$").expect("Invalid regex: grouped number")
});

/// Strip comma thousands separators from a well-formed grouped number.
///
/// Anything else is returned trimmed but otherwise untouched, so a stray
/// comma (`"2,7"`) still fails to parse.
///
/// # Example
///
/// ```rust,ignore
/// use customer_processing::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string(" 1,234.56 "), "1234.56");
/// assert_eq!(clean_numeric_string("2,7"), "2,7");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let trimmed = s.trim();
    if GROUPED_NUMBER.is_match(trimmed) {
        trimmed.replace(',', "")
    } else {
        trimmed.to_string()
    }
}

/// Parse a string as a finite f64.
///
/// Only surrounding whitespace and comma thousands separators are tolerated.
/// Currency symbols, percent signs and inner spaces make the value
/// unparseable. Non-finite results (`inf`, `NaN`) are rejected.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether a whole-valued f64 fits in an i64 without saturating.
pub fn fits_i64(value: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, which itself does not fit.
    value >= i64::MIN as f64 && value < i64::MAX as f64
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Most frequent non-null value of a string Series.
///
/// Ties are broken by taking the lexicographically smallest value, so the
/// result never depends on row order or hash iteration order.
pub fn string_mode(series: &Series) -> Option<String> {
    let str_chunked = series.str().ok()?;

    let mut value_counts: HashMap<&str, usize> = HashMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    value_counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, _)| val.to_string())
}

/// Most frequent non-null value of a Float64 Series.
///
/// Ties are broken by taking the smallest value. `NaN` is ignored.
pub fn numeric_mode(series: &Series) -> Option<f64> {
    let f64_chunked = series.f64().ok()?;

    // Keyed by bit pattern; `+ 0.0` folds -0.0 into 0.0.
    let mut value_counts: HashMap<u64, usize> = HashMap::new();
    for val in f64_chunked.into_iter().flatten().filter(|v| !v.is_nan()) {
        *value_counts.entry((val + 0.0).to_bits()).or_insert(0) += 1;
    }

    value_counts
        .into_iter()
        .max_by(|(a_bits, a_count), (b_bits, b_count)| {
            a_count
                .cmp(b_count)
                .then_with(|| f64::from_bits(*b_bits).total_cmp(&f64::from_bits(*a_bits)))
        })
        .map(|(bits, _)| f64::from_bits(bits))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a Float64 Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let values: Vec<Option<f64>> = series
        .f64()?
        .into_iter()
        .map(|val| Some(val.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let values: Vec<Option<String>> = series
        .str()?
        .into_iter()
        .map(|val| Some(val.unwrap_or(fill_value).to_string()))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

// =============================================================================
// Tests
// =============================================================================
