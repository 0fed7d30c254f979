//! Statistical imputation methods.
//!
//! Only mode imputation is needed for the customer table. The mode is
//! deterministic: ties go to the smallest value.

use crate::error::{PipelineError, Result};
use crate::schema::{CanonicalColumn, ColumnType};
use crate::types::ImputationRecord;
use crate::utils::{fill_numeric_nulls, fill_string_nulls, fits_i64, numeric_mode, string_mode};
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Replace every missing value of `column` with the column's mode.
    ///
    /// The mode is computed over non-missing values only. A column without
    /// missing values is left unchanged (the record reports zero fills).
    ///
    /// # Errors
    ///
    /// [`PipelineError::EmptyColumn`] if the column has no non-missing value.
    pub fn apply_mode_imputation(
        df: &mut DataFrame,
        column: CanonicalColumn,
    ) -> Result<ImputationRecord> {
        let col_name = column.name();
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();

        if missing == series.len() {
            return Err(PipelineError::EmptyColumn(col_name.to_string()));
        }

        let (filled, fill_value) = match column.column_type() {
            ColumnType::Text | ColumnType::Categorical => {
                let mode_val = string_mode(&series)
                    .ok_or_else(|| PipelineError::EmptyColumn(col_name.to_string()))?;
                (fill_string_nulls(&series, &mode_val)?, mode_val)
            }
            ColumnType::Float => {
                let mode_val = numeric_mode(&series)
                    .ok_or_else(|| PipelineError::EmptyColumn(col_name.to_string()))?;
                (fill_numeric_nulls(&series, mode_val)?, mode_val.to_string())
            }
            ColumnType::Integer => {
                let as_float = series.cast(&DataType::Float64)?;
                let mode_val = numeric_mode(&as_float)
                    .ok_or_else(|| PipelineError::EmptyColumn(col_name.to_string()))?;
                if !fits_i64(mode_val) {
                    let row = as_float
                        .f64()?
                        .into_iter()
                        .position(|v| v == Some(mode_val))
                        .unwrap_or(0);
                    return Err(PipelineError::DataType {
                        column: col_name.to_string(),
                        row,
                        value: mode_val.to_string(),
                        reason: "out of range for an integer".to_string(),
                    });
                }
                let filled = fill_numeric_nulls(&as_float, mode_val)?.cast(&DataType::Int64)?;
                (filled, (mode_val as i64).to_string())
            }
        };

        df.replace(col_name, filled)?;
        debug!(
            "Filled {} missing values in '{}' with mode '{}'",
            missing, col_name, fill_value
        );

        Ok(ImputationRecord {
            column,
            strategy: "mode".to_string(),
            fill_value,
            filled: missing,
        })
    }
}
