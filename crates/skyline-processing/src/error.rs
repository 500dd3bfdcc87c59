//! Custom error types for the cleaning pipeline.
//!
//! Validation problems (missing required columns, type mismatches, range
//! violations) are *not* errors: they are reported as
//! [`ValidationIssue`](crate::types::ValidationIssue)s. The variants below
//! cover conditions that stop a single operation from producing a table.
//!
//! Errors are serializable so that reports and `--json` output can carry
//! them as `{ code, message }` pairs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Input path does not resolve to a readable file.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Two columns ended up with the same name.
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A numeric operation was asked of a non-numeric column.
    #[error("Column '{column}' is not numeric (dtype: {dtype})")]
    NonNumericColumn { column: String, dtype: String },

    /// Missing-value strategy name could not be parsed.
    #[error("Unknown missing-value strategy '{0}' (expected mean, median, mode or drop)")]
    UnrecognizedStrategy(String),

    /// Outlier method name could not be parsed.
    #[error("Unknown outlier method '{0}' (expected iqr or zscore)")]
    UnrecognizedMethod(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

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
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::NonNumericColumn { .. } => "NON_NUMERIC_COLUMN",
            Self::UnrecognizedStrategy(_) => "UNRECOGNIZED_STRATEGY",
            Self::UnrecognizedMethod(_) => "UNRECOGNIZED_METHOD",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error means the input file is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if the caller can skip the failing operation and continue.
    ///
    /// Unknown strategy/method names only affect the operation they were
    /// passed to; everything else means the table could not be produced.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::UnrecognizedStrategy(_) | Self::UnrecognizedMethod(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

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
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::NotFound(PathBuf::from("x.csv")).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            ProcessingError::ColumnNotFound("height".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_not_found_through_context() {
        let error = ProcessingError::NotFound(PathBuf::from("missing.csv"))
            .with_context("Loading buildings");
        assert!(error.is_not_found());
        assert!(!ProcessingError::ColumnNotFound("a".into()).is_not_found());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ProcessingError::UnrecognizedStrategy("avg".to_string()).is_recoverable());
        assert!(ProcessingError::UnrecognizedMethod("mad".to_string()).is_recoverable());
        assert!(!ProcessingError::NotFound(PathBuf::from("a.csv")).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::NonNumericColumn {
            column: "city".to_string(),
            dtype: "String".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("NON_NUMERIC_COLUMN"));
        assert!(json.contains("city"));
    }

    #[test]
    fn test_with_context() {
        let error =
            ProcessingError::ColumnNotFound("floors".to_string()).with_context("During imputation");
        assert!(error.to_string().contains("During imputation"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}
