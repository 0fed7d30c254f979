//! Canonical customer schema and raw header normalization.
//!
//! Raw headers are mapped to canonical names by replacing whitespace with
//! underscores, lowercasing, stripping everything outside `[a-zA-Z0-9_]`,
//! and finally applying a small alias table for historical header spellings
//! (`CustomerID`, `Annual Income ($)`, `Spending Score (1-100)`).

use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s").expect("Invalid regex: whitespace"));

static NON_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("Invalid regex: identifier chars"));

/// Normalized spellings of historical headers and their canonical names.
const HEADER_ALIASES: [(&str, &str); 3] = [
    ("customerid", "customer_id"),
    ("annual_income_", "annual_income"),
    ("spending_score_1100", "spending_score"),
];

/// Declared value type of a canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Free-form string (identifiers)
    Text,
    /// String categories; the domain is whatever appears in the data
    Categorical,
    /// Floating point number
    Float,
    /// Whole number
    Integer,
}

impl ColumnType {
    /// Polars dtype used to hold values of this type.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Text | Self::Categorical => DataType::String,
            Self::Float => DataType::Float64,
            Self::Integer => DataType::Int64,
        }
    }
}

/// A column of the fixed target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    CustomerId,
    Gender,
    Age,
    AnnualIncome,
    SpendingScore,
    Profession,
    WorkExperience,
    FamilySize,
}

impl CanonicalColumn {
    /// Every canonical column, in table order.
    pub const ALL: [CanonicalColumn; 8] = [
        Self::CustomerId,
        Self::Gender,
        Self::Age,
        Self::AnnualIncome,
        Self::SpendingScore,
        Self::Profession,
        Self::WorkExperience,
        Self::FamilySize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CustomerId => "customer_id",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::AnnualIncome => "annual_income",
            Self::SpendingScore => "spending_score",
            Self::Profession => "profession",
            Self::WorkExperience => "work_experience",
            Self::FamilySize => "family_size",
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::CustomerId => ColumnType::Text,
            Self::Gender | Self::Profession => ColumnType::Categorical,
            Self::Age | Self::AnnualIncome | Self::SpendingScore | Self::WorkExperience => {
                ColumnType::Float
            }
            Self::FamilySize => ColumnType::Integer,
        }
    }

    /// Look up a canonical column by its exact canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|col| col.name() == name)
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a single raw header was interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    pub raw: String,
    pub normalized: String,
    /// `None` when the header is not part of the canonical schema and will be dropped.
    pub canonical: Option<CanonicalColumn>,
}

/// Normalize one raw header to its canonical spelling.
///
/// ```rust,ignore
/// assert_eq!(normalize_header("CustomerID"), "customer_id");
/// assert_eq!(normalize_header("Annual Income ($)"), "annual_income");
/// ```
pub fn normalize_header(raw: &str) -> String {
    let underscored = WHITESPACE.replace_all(raw, "_").to_lowercase();
    let stripped = NON_IDENTIFIER.replace_all(&underscored, "");

    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == stripped)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| stripped.into_owned())
}

/// Maps raw table headers onto the canonical schema.
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Interpret every raw header without touching any data.
    pub fn map_headers(&self, df: &DataFrame) -> Vec<HeaderMapping> {
        df.get_column_names()
            .into_iter()
            .map(|raw| {
                let normalized = normalize_header(raw);
                let canonical = CanonicalColumn::from_name(&normalized);
                HeaderMapping {
                    raw: raw.to_string(),
                    normalized,
                    canonical,
                }
            })
            .collect()
    }

    /// Rename columns to canonical names and project onto the canonical schema.
    ///
    /// Columns outside the schema are dropped. The result always has exactly
    /// the canonical columns, in [`CanonicalColumn::ALL`] order.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::DuplicateColumn`] if two raw headers normalize to the
    ///   same canonical name.
    /// - [`PipelineError::Schema`] if any canonical column is absent.
    pub fn normalize(&self, df: DataFrame) -> Result<DataFrame> {
        let mappings = self.map_headers(&df);

        let mut sources: HashMap<CanonicalColumn, String> = HashMap::new();
        for mapping in &mappings {
            let Some(canonical) = mapping.canonical else {
                debug!("Dropping non-canonical column '{}'", mapping.raw);
                continue;
            };
            if let Some(first) = sources.get(&canonical) {
                return Err(PipelineError::DuplicateColumn {
                    canonical: canonical.name().to_string(),
                    first: first.clone(),
                    second: mapping.raw.clone(),
                });
            }
            sources.insert(canonical, mapping.raw.clone());
        }

        let missing: Vec<String> = CanonicalColumn::ALL
            .iter()
            .filter(|col| !sources.contains_key(col))
            .map(|col| col.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::Schema { missing });
        }

        let selection: Vec<PlSmallStr> = CanonicalColumn::ALL
            .iter()
            .map(|col| sources[col].as_str().into())
            .collect();
        let mut df = df.select(selection)?;

        for col in CanonicalColumn::ALL {
            let raw = &sources[&col];
            if raw != col.name() {
                debug!("Renaming '{}' -> '{}'", raw, col);
                df.rename(raw, col.name().into())?;
            }
        }

        Ok(df)
    }
}
