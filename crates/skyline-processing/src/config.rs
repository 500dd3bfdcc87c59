//! Configuration types for the cleaning pipeline.
//!
//! This module provides the strategy enums used by the individual stages and
//! a [`PipelineConfig`] assembled through a validating builder. Configs are
//! serde types, so a JSON file can stand in for the builder.

use crate::error::ProcessingError;
use crate::types::{ColumnKind, RangeRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Strategy for handling missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Replace nulls with the mean of non-null values
    #[default]
    Mean,
    /// Replace nulls with the median of non-null values
    Median,
    /// Replace nulls with the most frequent value
    Mode,
    /// Drop rows with a null in the column
    Drop,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Drop => "drop",
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingStrategy {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            "drop" => Ok(Self::Drop),
            _ => Err(ProcessingError::UnrecognizedStrategy(s.to_string())),
        }
    }
}

/// Method for detecting outliers in a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR]
    #[default]
    Iqr,
    /// More than 3 population standard deviations from the mean
    #[serde(rename = "zscore")]
    ZScore,
}

impl OutlierMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::ZScore => "zscore",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutlierMethod {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(Self::Iqr),
            "zscore" | "z-score" | "z_score" => Ok(Self::ZScore),
            _ => Err(ProcessingError::UnrecognizedMethod(s.to_string())),
        }
    }
}

/// A column to run outlier detection on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierCheck {
    pub column: String,
    #[serde(default)]
    pub method: OutlierMethod,
}

impl OutlierCheck {
    pub fn new(column: impl Into<String>, method: OutlierMethod) -> Self {
        Self {
            column: column.into(),
            method,
        }
    }
}

impl FromStr for OutlierCheck {
    type Err = ProcessingError;

    /// Parses `column` or `column:method`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((column, method)) => Ok(Self::new(column.trim(), method.parse()?)),
            None => Ok(Self::new(s.trim(), OutlierMethod::default())),
        }
    }
}

/// Checks run by the validator at the end of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub expected_kinds: BTreeMap<String, ColumnKind>,
    #[serde(default)]
    pub ranges: BTreeMap<String, RangeRule>,
    /// Report columns that still contain nulls.
    #[serde(default = "default_true")]
    pub check_missing: bool,
    /// Report fully duplicated rows.
    #[serde(default = "default_true")]
    pub check_duplicates: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            required_columns: Vec::new(),
            expected_kinds: BTreeMap::new(),
            ranges: BTreeMap::new(),
            check_missing: true,
            check_duplicates: true,
        }
    }
}

/// Earliest completion year accepted for a building.
pub const EARLIEST_COMPLETION_YEAR: f64 = 1800.0;

impl ValidationRules {
    /// Rules for the tallest-buildings table.
    ///
    /// Heights and floor counts must be positive and completion years must lie
    /// between 1800 and `reference_year` inclusive.
    pub fn buildings(reference_year: i32) -> Self {
        let required_columns = ["building", "city", "country", "height", "floors", "year_completed"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let expected_kinds = BTreeMap::from([
            ("height".to_string(), ColumnKind::Numeric),
            ("floors".to_string(), ColumnKind::Numeric),
            ("year_completed".to_string(), ColumnKind::Numeric),
            ("city".to_string(), ColumnKind::String),
        ]);

        let ranges = BTreeMap::from([
            ("height".to_string(), RangeRule::positive()),
            ("floors".to_string(), RangeRule::positive()),
            (
                "year_completed".to_string(),
                RangeRule::inclusive(EARLIEST_COMPLETION_YEAR, f64::from(reference_year)),
            ),
        ]);

        Self {
            required_columns,
            expected_kinds,
            ranges,
            check_missing: true,
            check_duplicates: true,
        }
    }
}

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust
/// use skyline_processing::config::{MissingStrategy, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .missing_strategy(MissingStrategy::Median)
///     .reference_year(2024)
///     .build()
///     .unwrap();
/// assert_eq!(config.reference_year, Some(2024));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether to run missing-value handling at all.
    /// Default: true
    pub handle_missing: bool,

    /// Strategy for handling missing values.
    /// Default: Mean
    pub missing_strategy: MissingStrategy,

    /// Columns to apply the missing-value strategy to, in order.
    /// `None` means every column.
    /// Default: None
    pub missing_columns: Option<Vec<String>>,

    /// Whether to remove duplicate rows.
    /// Default: true
    pub remove_duplicates: bool,

    /// Whether to convert formatted numeric text before the numeric stages.
    /// Default: true
    pub coerce_numeric: bool,

    /// Columns holding formatted numbers ("828 m", "1,000") to convert.
    /// Columns that are absent or already numeric are skipped.
    /// Default: height, floors, year_completed
    pub numeric_columns: Vec<String>,

    /// Outlier checks to run (detection only, rows are kept).
    /// Default: height with IQR
    pub outlier_checks: Vec<OutlierCheck>,

    /// Column holding the completion year.
    /// Default: "year_completed"
    pub year_column: String,

    /// Column holding the height in metres.
    /// Default: "height"
    pub height_column: String,

    /// Year used to compute building age. Building age is not derived
    /// when unset.
    /// Default: None
    pub reference_year: Option<i32>,

    /// Whether to add the `height_category` column.
    /// Default: true
    pub derive_height_category: bool,

    /// Columns to min-max normalize into `<column>_normalized`.
    /// Default: empty
    pub normalize_columns: Vec<String>,

    /// Validation rules for the final table. When `None`, the building rules
    /// are used with `reference_year` (or no upper year bound if unset).
    /// Default: None
    pub validation: Option<ValidationRules>,

    /// Where to write the cleaned table. Nothing is written when unset.
    /// Default: None
    pub output_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            handle_missing: true,
            missing_strategy: MissingStrategy::default(),
            missing_columns: None,
            remove_duplicates: true,
            coerce_numeric: true,
            numeric_columns: default_numeric_columns(),
            outlier_checks: vec![OutlierCheck::new("height", OutlierMethod::Iqr)],
            year_column: "year_completed".to_string(),
            height_column: "height".to_string(),
            reference_year: None,
            derive_height_category: true,
            normalize_columns: Vec::new(),
            validation: None,
            output_path: None,
        }
    }
}

fn default_numeric_columns() -> Vec<String> {
    ["height", "floors", "year_completed"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| ProcessingError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Rules the validator will apply to the final table.
    pub fn effective_validation_rules(&self) -> ValidationRules {
        match (&self.validation, self.reference_year) {
            (Some(rules), _) => rules.clone(),
            (None, Some(year)) => ValidationRules::buildings(year),
            (None, None) => {
                let mut rules = ValidationRules::buildings(0);
                rules.ranges.insert(
                    "year_completed".to_string(),
                    RangeRule::at_least(EARLIEST_COMPLETION_YEAR),
                );
                rules
            }
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.year_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName("year_column".to_string()));
        }
        if self.height_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName("height_column".to_string()));
        }

        if let Some(columns) = &self.missing_columns
            && columns.iter().any(|c| c.trim().is_empty())
        {
            return Err(ConfigValidationError::EmptyColumnName("missing_columns".to_string()));
        }

        if self
            .outlier_checks
            .iter()
            .any(|c| c.column.trim().is_empty())
        {
            return Err(ConfigValidationError::EmptyColumnName("outlier_checks".to_string()));
        }

        if self.normalize_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyColumnName("normalize_columns".to_string()));
        }

        if let Some(rules) = &self.validation {
            for (column, rule) in &rules.ranges {
                if let (Some(min), Some(max)) = (rule.min, rule.max)
                    && min.value > max.value
                {
                    return Err(ConfigValidationError::InvalidRange {
                        column: column.clone(),
                        min: min.value,
                        max: max.value,
                    });
                }
            }
        }

        if let Some(year) = self.reference_year
            && f64::from(year) < EARLIEST_COMPLETION_YEAR
        {
            return Err(ConfigValidationError::InvalidReferenceYear(year));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Empty column name in '{0}'")]
    EmptyColumnName(String),

    #[error("Invalid range for '{column}': min {min} is greater than max {max}")]
    InvalidRange { column: String, min: f64, max: f64 },

    #[error("Invalid reference year: {0} (must be at least 1800)")]
    InvalidReferenceYear(i32),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    handle_missing: Option<bool>,
    missing_strategy: Option<MissingStrategy>,
    missing_columns: Option<Vec<String>>,
    remove_duplicates: Option<bool>,
    coerce_numeric: Option<bool>,
    numeric_columns: Option<Vec<String>>,
    outlier_checks: Option<Vec<OutlierCheck>>,
    year_column: Option<String>,
    height_column: Option<String>,
    reference_year: Option<i32>,
    derive_height_category: Option<bool>,
    normalize_columns: Option<Vec<String>>,
    validation: Option<ValidationRules>,
    output_path: Option<PathBuf>,
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from JSON).
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            handle_missing: Some(config.handle_missing),
            missing_strategy: Some(config.missing_strategy),
            missing_columns: config.missing_columns,
            remove_duplicates: Some(config.remove_duplicates),
            coerce_numeric: Some(config.coerce_numeric),
            numeric_columns: Some(config.numeric_columns),
            outlier_checks: Some(config.outlier_checks),
            year_column: Some(config.year_column),
            height_column: Some(config.height_column),
            reference_year: config.reference_year,
            derive_height_category: Some(config.derive_height_category),
            normalize_columns: Some(config.normalize_columns),
            validation: config.validation,
            output_path: config.output_path,
        }
    }

    /// Enable or disable missing-value handling.
    pub fn handle_missing(mut self, handle: bool) -> Self {
        self.handle_missing = Some(handle);
        self
    }

    /// Set the missing-value strategy.
    pub fn missing_strategy(mut self, strategy: MissingStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    /// Restrict the missing-value strategy to these columns, applied in order.
    pub fn missing_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Enable or disable conversion of formatted numeric text.
    pub fn coerce_numeric(mut self, coerce: bool) -> Self {
        self.coerce_numeric = Some(coerce);
        self
    }

    /// Set the columns to convert from formatted text to numbers.
    pub fn numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the outlier checks.
    pub fn outlier_checks(mut self, checks: Vec<OutlierCheck>) -> Self {
        self.outlier_checks = Some(checks);
        self
    }

    /// Set the completion-year column.
    pub fn year_column(mut self, column: impl Into<String>) -> Self {
        self.year_column = Some(column.into());
        self
    }

    /// Set the height column.
    pub fn height_column(mut self, column: impl Into<String>) -> Self {
        self.height_column = Some(column.into());
        self
    }

    /// Set the year building age is measured from.
    pub fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Enable or disable the height category column.
    pub fn derive_height_category(mut self, derive: bool) -> Self {
        self.derive_height_category = Some(derive);
        self
    }

    /// Set the columns to min-max normalize.
    pub fn normalize_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.normalize_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Use custom validation rules instead of the building rules.
    pub fn validation(mut self, rules: ValidationRules) -> Self {
        self.validation = Some(rules);
        self
    }

    /// Set where the cleaned table is written.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            handle_missing: self.handle_missing.unwrap_or(true),
            missing_strategy: self.missing_strategy.unwrap_or_default(),
            missing_columns: self.missing_columns,
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            coerce_numeric: self.coerce_numeric.unwrap_or(true),
            numeric_columns: self.numeric_columns.unwrap_or(defaults.numeric_columns),
            outlier_checks: self.outlier_checks.unwrap_or(defaults.outlier_checks),
            year_column: self.year_column.unwrap_or(defaults.year_column),
            height_column: self.height_column.unwrap_or(defaults.height_column),
            reference_year: self.reference_year,
            derive_height_category: self.derive_height_category.unwrap_or(true),
            normalize_columns: self.normalize_columns.unwrap_or_default(),
            validation: self.validation,
            output_path: self.output_path,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.missing_strategy, MissingStrategy::Mean);
        assert!(config.remove_duplicates);
        assert_eq!(config.year_column, "year_completed");
        assert_eq!(config.height_column, "height");
        assert!(config.reference_year.is_none());
        assert_eq!(config.outlier_checks.len(), 1);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .missing_strategy(MissingStrategy::Drop)
            .missing_columns(["height", "floors"])
            .remove_duplicates(false)
            .reference_year(2024)
            .normalize_columns(["height"])
            .build()
            .unwrap();

        assert_eq!(config.missing_strategy, MissingStrategy::Drop);
        assert_eq!(
            config.missing_columns,
            Some(vec!["height".to_string(), "floors".to_string()])
        );
        assert!(!config.remove_duplicates);
        assert_eq!(config.reference_year, Some(2024));
        assert_eq!(config.normalize_columns, vec!["height".to_string()]);
    }

    #[test]
    fn test_validation_invalid_range() {
        let mut rules = ValidationRules::default();
        rules
            .ranges
            .insert("height".to_string(), RangeRule::inclusive(10.0, 1.0));

        let result = PipelineConfig::builder().validation(rules).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidRange { .. }
        ));
    }

    #[test]
    fn test_validation_empty_column_name() {
        let result = PipelineConfig::builder().normalize_columns([" "]).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyColumnName(_)
        ));
    }

    #[test]
    fn test_validation_reference_year() {
        let result = PipelineConfig::builder().reference_year(1066).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidReferenceYear(1066)
        ));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Median".parse::<MissingStrategy>().unwrap(), MissingStrategy::Median);
        assert_eq!(" drop ".parse::<MissingStrategy>().unwrap(), MissingStrategy::Drop);
        let err = "average".parse::<MissingStrategy>().unwrap_err();
        assert_eq!(err.error_code(), "UNRECOGNIZED_STRATEGY");
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("zscore".parse::<OutlierMethod>().unwrap(), OutlierMethod::ZScore);
        assert_eq!("IQR".parse::<OutlierMethod>().unwrap(), OutlierMethod::Iqr);
        let err = "mad".parse::<OutlierMethod>().unwrap_err();
        assert_eq!(err.error_code(), "UNRECOGNIZED_METHOD");
    }

    #[test]
    fn test_outlier_check_from_str() {
        let check: OutlierCheck = "height".parse().unwrap();
        assert_eq!(check, OutlierCheck::new("height", OutlierMethod::Iqr));

        let check: OutlierCheck = "floors:zscore".parse().unwrap();
        assert_eq!(check, OutlierCheck::new("floors", OutlierMethod::ZScore));

        assert!("floors:median".parse::<OutlierCheck>().is_err());
    }

    #[test]
    fn test_effective_rules_follow_reference_year() {
        let config = PipelineConfig::builder()
            .reference_year(2024)
            .build()
            .unwrap();
        let rules = config.effective_validation_rules();
        let years = rules.ranges["year_completed"];
        assert!(years.contains(2024.0));
        assert!(!years.contains(2025.0));

        let open = PipelineConfig::default().effective_validation_rules();
        assert!(open.ranges["year_completed"].contains(3000.0));
        assert!(!open.ranges["year_completed"].contains(1799.0));
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "missing_strategy": "median",
            "missing_columns": ["height"],
            "remove_duplicates": false,
            "outlier_checks": [{ "column": "floors", "method": "zscore" }],
            "reference_year": 2023,
            "normalize_columns": ["height"],
            "output_path": "out/cleaned.csv"
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(config.missing_strategy, MissingStrategy::Median);
        assert_eq!(config.missing_columns, Some(vec!["height".to_string()]));
        assert!(!config.remove_duplicates);
        assert_eq!(
            config.outlier_checks,
            vec![OutlierCheck::new("floors", OutlierMethod::ZScore)]
        );
        assert_eq!(config.reference_year, Some(2023));
        // Unspecified fields fall back to defaults
        assert_eq!(config.year_column, "year_completed");
        assert!(config.derive_height_category);
        assert_eq!(
            config.output_path.as_deref().and_then(|p| p.to_str()),
            Some("out/cleaned.csv")
        );
    }

    #[test]
    fn test_unknown_strategy_in_json_is_rejected() {
        let json = r#"{ "missing_strategy": "average" }"#;
        assert!(serde_json::from_str::<PipelineConfig>(json).is_err());
    }

    #[test]
    fn test_unknown_names_are_recoverable() {
        let strategy = "average".parse::<MissingStrategy>().unwrap_err();
        assert!(strategy.is_recoverable());

        let check = "floors:mad".parse::<OutlierCheck>().unwrap_err();
        assert!(check.is_recoverable());
    }

    #[test]
    fn test_validation_rules_default_matches_empty_json() {
        let parsed: ValidationRules = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ValidationRules::default());
        assert!(parsed.check_missing);
        assert!(parsed.check_duplicates);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = PipelineConfig::builder()
            .reference_year(2020)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reference_year, Some(2020));
        assert_eq!(back.missing_strategy, config.missing_strategy);
        assert_eq!(back.outlier_checks, config.outlier_checks);
    }
}
