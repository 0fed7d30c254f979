//! Type coercion of normalized columns to their declared canonical types.

use super::sanitizers::ensure_no_missing;
use crate::error::{PipelineError, Result};
use crate::schema::{CanonicalColumn, ColumnType};
use crate::utils::{fits_i64, is_integer_dtype, is_numeric_dtype, parse_numeric_string};
use polars::prelude::*;
use tracing::{debug, warn};

const INTEGER_RANGE: &str = "out of range for an integer";

/// Converts every canonical column to its declared type.
///
/// Coercion is strict: a value that cannot
/// be read as the declared type aborts the run with
/// [`PipelineError::DataType`]. Row indices in errors refer to the table as
/// it enters this stage.
pub struct TypeCoercer;

impl TypeCoercer {
    /// Coerce column types on a schema-normalized frame.
    ///
    /// Returns the coerced frame and a description of each conversion made.
    pub fn coerce_column_types(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        let mut df = df;
        let mut coercion_steps = Vec::new();

        debug!("Coercing column types...");

        for col in CanonicalColumn::ALL {
            let series = df.column(col.name())?.as_materialized_series().clone();
            let corrected = match col.column_type() {
                ColumnType::Text | ColumnType::Categorical => self.to_string_column(&series)?,
                ColumnType::Float => self.to_float_column(col, &series)?,
                ColumnType::Integer => self.to_integer_column(col, &series)?,
            };

            if corrected.dtype() != series.dtype() {
                let step = format!(
                    "Converted '{}' from {} to {}",
                    col,
                    series.dtype(),
                    corrected.dtype()
                );
                debug!("  {}", step);
                coercion_steps.push(step);
            }
            df.replace(col.name(), corrected)?;
        }

        ensure_no_missing(&df, CanonicalColumn::CustomerId)?;
        self.validate_ranges(&df)?;

        Ok((df, coercion_steps))
    }

    fn to_string_column(&self, series: &Series) -> Result<Series> {
        if series.dtype() == &DataType::String {
            return Ok(series.clone());
        }
        Ok(series.cast(&DataType::String)?)
    }

    fn to_float_column(&self, col: CanonicalColumn, series: &Series) -> Result<Series> {
        match series.dtype() {
            DataType::Float64 => Ok(series.clone()),
            DataType::String => self.parse_float_strings(col, series),
            dtype if is_numeric_dtype(dtype) || dtype == &DataType::Null => {
                Ok(series.cast(&DataType::Float64)?)
            }
            dtype => Err(self.unsupported_dtype(col, series, dtype)),
        }
    }

    fn to_integer_column(&self, col: CanonicalColumn, series: &Series) -> Result<Series> {
        if is_integer_dtype(series.dtype()) {
            let cast = series.cast(&DataType::Int64)?;
            // Non-strict cast turns out-of-range values (large UInt64) into nulls.
            if cast.null_count() != series.null_count() {
                let present = series.is_not_null();
                let lost = cast.is_null();
                let row = present
                    .iter()
                    .zip(lost.iter())
                    .position(|(was, now)| was == Some(true) && now == Some(true))
                    .unwrap_or(0);
                return Err(PipelineError::DataType {
                    column: col.name().to_string(),
                    row,
                    value: series.get(row).map(|v| v.to_string()).unwrap_or_default(),
                    reason: INTEGER_RANGE.to_string(),
                });
            }
            return Ok(cast);
        }

        let floats = self.to_float_column(col, series)?;
        let mut values = Vec::with_capacity(floats.len());
        for (row, val) in floats.f64()?.into_iter().enumerate() {
            match val {
                Some(v) if v.fract() != 0.0 => {
                    return Err(PipelineError::DataType {
                        column: col.name().to_string(),
                        row,
                        value: v.to_string(),
                        reason: "expected a whole number".to_string(),
                    });
                }
                Some(v) if !fits_i64(v) => {
                    return Err(PipelineError::DataType {
                        column: col.name().to_string(),
                        row,
                        value: v.to_string(),
                        reason: INTEGER_RANGE.to_string(),
                    });
                }
                Some(v) => values.push(Some(v as i64)),
                None => values.push(None),
            }
        }

        Ok(Series::new(col.name().into(), values))
    }

    /// Parse a string column as numbers. Blank strings become missing.
    fn parse_float_strings(&self, col: CanonicalColumn, series: &Series) -> Result<Series> {
        let str_series = series.str()?;
        let mut values = Vec::with_capacity(str_series.len());

        for (row, opt_val) in str_series.into_iter().enumerate() {
            let parsed = match opt_val {
                None => None,
                Some(raw) if raw.trim().is_empty() => None,
                Some(raw) => Some(parse_numeric_string(raw).ok_or_else(|| {
                    PipelineError::DataType {
                        column: col.name().to_string(),
                        row,
                        value: raw.to_string(),
                        reason: "not a number".to_string(),
                    }
                })?),
            };
            values.push(parsed);
        }

        Ok(Series::new(col.name().into(), values))
    }

    fn unsupported_dtype(
        &self,
        col: CanonicalColumn,
        series: &Series,
        dtype: &DataType,
    ) -> PipelineError {
        let present = series.is_not_null();
        let row = present
            .iter()
            .position(|v| v == Some(true))
            .unwrap_or(0);
        let value = series
            .get(row)
            .map(|v| v.to_string())
            .unwrap_or_default();

        PipelineError::DataType {
            column: col.name().to_string(),
            row,
            value,
            reason: format!("{} values are not numeric", dtype),
        }
    }

    /// Enforce value domains on the coerced frame.
    fn validate_ranges(&self, df: &DataFrame) -> Result<()> {
        let age = df
            .column(CanonicalColumn::Age.name())?
            .as_materialized_series()
            .f64()?;
        for (row, val) in age.into_iter().enumerate() {
            if let Some(v) = val
                && v < 0.0
            {
                return Err(PipelineError::DataType {
                    column: CanonicalColumn::Age.name().to_string(),
                    row,
                    value: v.to_string(),
                    reason: "age cannot be negative".to_string(),
                });
            }
        }

        let scores = df
            .column(CanonicalColumn::SpendingScore.name())?
            .as_materialized_series()
            .f64()?;
        let out_of_range = scores
            .into_iter()
            .flatten()
            .filter(|v| !(0.0..=100.0).contains(v))
            .count();
        if out_of_range > 0 {
            warn!(
                "{} spending scores fall outside 0-100 and will not be banded",
                out_of_range
            );
        }

        Ok(())
    }
}
