//! Error types for the customer cleaning pipeline and query layer.
//!
//! Every failure in `clean()` is fatal: the pipeline never hands back a
//! partially cleaned table. Errors serialize as `{code, message}` so a
//! reporting front end can display them without matching on variants.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline and analytical store.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Canonical columns are absent after header normalization.
    #[error("Input schema is missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Two raw headers normalize to the same canonical name.
    #[error("Headers {first:?} and {second:?} both normalize to '{canonical}'")]
    DuplicateColumn {
        canonical: String,
        first: String,
        second: String,
    },

    /// A value cannot be interpreted as the column's declared type.
    #[error("Column '{column}' row {row}: cannot interpret {value:?} ({reason})")]
    DataType {
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    /// Mode imputation was requested on a column with no observed values.
    #[error("Cannot impute column '{0}': it has no non-missing values")]
    EmptyColumn(String),

    /// Analytical store failure.
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, preserved through any added context.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "SCHEMA_ERROR",
            Self::DuplicateColumn { .. } => "SCHEMA_ERROR",
            Self::DataType { .. } => "DATA_TYPE_ERROR",
            Self::EmptyColumn(_) => "EMPTY_COLUMN_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The input schema changed (missing or colliding canonical columns).
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::Schema { .. } | Self::DuplicateColumn { .. } => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }

    /// The input data itself is defective (bad value or empty column).
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::DataType { .. } | Self::EmptyColumn(_) => true,
            Self::WithContext { source, .. } => source.is_data_error(),
            _ => false,
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Store(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = PipelineError::Schema {
            missing: vec!["age".to_string()],
        };
        assert_eq!(err.error_code(), "SCHEMA_ERROR");
        assert_eq!(
            PipelineError::EmptyColumn("age".to_string()).error_code(),
            "EMPTY_COLUMN_ERROR"
        );
    }

    #[test]
    fn test_schema_message_lists_columns() {
        let err = PipelineError::Schema {
            missing: vec!["age".to_string(), "profession".to_string()],
        };
        assert!(err.to_string().contains("age, profession"));
    }

    #[test]
    fn test_taxonomy() {
        let data_err = PipelineError::DataType {
            column: "age".to_string(),
            row: 3,
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert!(data_err.is_data_error());
        assert!(!data_err.is_schema_error());

        let schema_err = PipelineError::DuplicateColumn {
            canonical: "age".to_string(),
            first: "Age".to_string(),
            second: "AGE".to_string(),
        };
        assert!(schema_err.is_schema_error());
        assert!(!schema_err.is_data_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = PipelineError::EmptyColumn("profession".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("EMPTY_COLUMN_ERROR"));
        assert!(json.contains("profession"));
    }

    #[test]
    fn test_with_context() {
        let error = PipelineError::EmptyColumn("age".to_string()).with_context("During imputation");
        assert!(error.to_string().contains("During imputation"));
        assert_eq!(error.error_code(), "EMPTY_COLUMN_ERROR");
        assert!(error.is_data_error());
    }
}
