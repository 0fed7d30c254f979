//! Row and value sanitization: deduplication, case folding, sentinel translation.

use crate::error::{PipelineError, Result};
use crate::schema::CanonicalColumn;
use crate::types::MissingCount;
use polars::prelude::*;
use tracing::debug;

/// Remove exact duplicate rows, keeping the first occurrence of each.
///
/// Row order of the survivors is preserved and missing values compare equal.
/// Returns the deduplicated frame and the number of rows removed.
pub fn remove_duplicates(df: DataFrame) -> Result<(DataFrame, usize)> {
    let before = df.height();
    let df = df
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    let removed = before - df.height();

    debug!("Removed {} duplicate rows", removed);
    Ok((df, removed))
}

/// Lowercase every value of the given string columns.
///
/// Only case changes; surrounding whitespace is kept as is.
pub fn lowercase_columns(df: DataFrame, columns: &[CanonicalColumn]) -> Result<DataFrame> {
    let mut df = df;

    for col in columns {
        let series = df.column(col.name())?.as_materialized_series();
        let lowered: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|val| val.map(str::to_lowercase))
            .collect();

        df.replace(col.name(), Series::new(col.name().into(), lowered))?;
        debug!("Lowercased column '{}'", col);
    }

    Ok(df)
}

/// Replace the age sentinel `0` with missing.
///
/// Expects `age` to already be Float64. Returns the frame and the number of
/// values translated.
pub fn translate_age_sentinel(df: DataFrame) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let column = CanonicalColumn::Age.name();

    let series = df.column(column)?.as_materialized_series();
    let mut replaced = 0usize;
    let values: Vec<Option<f64>> = series
        .f64()?
        .into_iter()
        .map(|val| match val {
            Some(v) if v == 0.0 => {
                replaced += 1;
                None
            }
            other => other,
        })
        .collect();

    df.replace(column, Series::new(column.into(), values))?;
    debug!("Translated {} age sentinel values to missing", replaced);
    Ok((df, replaced))
}

/// Missing-value count for every column, in column order.
pub fn missing_value_counts(df: &DataFrame) -> Vec<MissingCount> {
    df.get_columns()
        .iter()
        .map(|col| MissingCount {
            column: col.name().to_string(),
            missing: col.null_count(),
        })
        .collect()
}

/// Fail if `column` still holds any missing value.
pub(crate) fn ensure_no_missing(df: &DataFrame, column: CanonicalColumn) -> Result<()> {
    let series = df.column(column.name())?.as_materialized_series();
    let nulls = series.is_null();
    if let Some(row) = nulls.iter().position(|v| v == Some(true)) {
        return Err(PipelineError::DataType {
            column: column.name().to_string(),
            row,
            value: String::new(),
            reason: "value is required".to_string(),
        });
    }
    Ok(())
}
