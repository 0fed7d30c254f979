use crate::error::{PipelineError, Result};
use crate::schema::CanonicalColumn;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The output of a successful cleaning run.
///
/// Only the pipeline can construct one, so holding a `CleanedTable` means
/// every cleaning step has completed:
/// - no two rows are exactly equal
/// - `age` and `profession` have no missing values
/// - `gender` and `profession` are lowercase strings
/// - `customer_id` is a non-missing string on every row
#[derive(Debug, Clone)]
pub struct CleanedTable {
    df: DataFrame,
}

impl CleanedTable {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// `(column, dtype)` listing in canonical order.
    pub fn column_types(&self) -> Vec<ColumnTypeInfo> {
        self.df
            .get_columns()
            .iter()
            .map(|col| ColumnTypeInfo {
                column: col.name().to_string(),
                dtype: col.dtype().to_string(),
            })
            .collect()
    }

    /// Typed row view of the table.
    pub fn records(&self) -> Result<Vec<CustomerRecord>> {
        let ids = self.series(CanonicalColumn::CustomerId)?.str()?;
        let genders = self.series(CanonicalColumn::Gender)?.str()?;
        let ages = self.series(CanonicalColumn::Age)?.f64()?;
        let incomes = self.series(CanonicalColumn::AnnualIncome)?.f64()?;
        let scores = self.series(CanonicalColumn::SpendingScore)?.f64()?;
        let professions = self.series(CanonicalColumn::Profession)?.str()?;
        let experience = self.series(CanonicalColumn::WorkExperience)?.f64()?;
        let family_sizes = self.series(CanonicalColumn::FamilySize)?.i64()?;

        let required = |col: CanonicalColumn, row: usize| PipelineError::DataType {
            column: col.name().to_string(),
            row,
            value: String::new(),
            reason: "value is required".to_string(),
        };

        (0..self.df.height())
            .map(|row| -> Result<CustomerRecord> {
                Ok(CustomerRecord {
                    customer_id: ids
                        .get(row)
                        .ok_or_else(|| required(CanonicalColumn::CustomerId, row))?
                        .to_string(),
                    gender: genders.get(row).map(str::to_string),
                    age: ages
                        .get(row)
                        .ok_or_else(|| required(CanonicalColumn::Age, row))?,
                    annual_income: incomes.get(row),
                    spending_score: scores.get(row),
                    profession: professions
                        .get(row)
                        .ok_or_else(|| required(CanonicalColumn::Profession, row))?
                        .to_string(),
                    work_experience: experience.get(row),
                    family_size: family_sizes.get(row),
                })
            })
            .collect()
    }

    fn series(&self, col: CanonicalColumn) -> Result<&Series> {
        Ok(self.df.column(col.name())?.as_materialized_series())
    }
}

impl PartialEq for CleanedTable {
    fn eq(&self, other: &Self) -> bool {
        self.df.equals_missing(&other.df)
    }
}

/// One cleaned customer row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub gender: Option<String>,
    pub age: f64,
    pub annual_income: Option<f64>,
    pub spending_score: Option<f64>,
    pub profession: String,
    pub work_experience: Option<f64>,
    pub family_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    pub column: String,
    pub dtype: String,
}

/// A single imputation applied to a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: CanonicalColumn,
    pub strategy: String,
    /// Fill value rendered as text
    pub fill_value: String,
    /// Number of missing values replaced
    pub filled: usize,
}

/// What a cleaning run did to the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after_dedup: usize,
    pub rows_after: usize,
    /// Exact duplicates removed from the schema-normalized input
    pub duplicates_removed: usize,
    /// Duplicates that only appeared after case folding or imputation
    pub late_duplicates_removed: usize,
    pub age_sentinels_replaced: usize,
    /// Missing counts per column after type coercion, before any imputation
    pub missing_before_imputation: Vec<MissingCount>,
    pub column_types: Vec<ColumnTypeInfo>,
    pub imputations: Vec<ImputationRecord>,
    pub processing_steps: Vec<String>,
    pub duration_ms: u64,
}

impl CleaningSummary {
    pub fn total_rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn total_values_imputed(&self) -> usize {
        self.imputations.iter().map(|i| i.filled).sum()
    }
}

/// A cleaned table together with the summary of how it was produced.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub table: CleanedTable,
    pub summary: CleaningSummary,
}
