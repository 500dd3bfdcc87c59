use serde::{Deserialize, Serialize};

use crate::utils::DtypeCategory;

// ============================================================================
// Profiling Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub shape: (usize, usize),
    pub column_profiles: Vec<ColumnProfile>,
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub sample_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
}

/// Summary statistics of a numeric column (nulls ignored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (N - 1).
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

// ============================================================================
// Validation Types
// ============================================================================

/// Expected kind of a column, as checked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Any integer or float column.
    Numeric,
    /// Integer columns only.
    Integer,
    /// Float columns only.
    Float,
    /// String or categorical columns.
    String,
    /// Boolean columns.
    Boolean,
}

impl ColumnKind {
    /// Check whether a column of the given dtype category satisfies this kind.
    pub fn accepts(&self, category: DtypeCategory) -> bool {
        match self {
            Self::Numeric => category.is_numeric(),
            Self::Integer => category == DtypeCategory::Integer,
            Self::Float => category == DtypeCategory::Float,
            Self::String => category == DtypeCategory::String,
            Self::Boolean => category == DtypeCategory::Boolean,
        }
    }
}

/// One end of a [`RangeRule`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Bound {
    pub fn closed(value: f64) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    pub fn open(value: f64) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

/// Numeric range constraint for a column. Missing bounds are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Bound>,
}

impl RangeRule {
    /// `min <= v <= max`.
    pub fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min: Some(Bound::closed(min)),
            max: Some(Bound::closed(max)),
        }
    }

    /// `min < v < max`.
    pub fn exclusive(min: f64, max: f64) -> Self {
        Self {
            min: Some(Bound::open(min)),
            max: Some(Bound::open(max)),
        }
    }

    /// `v > 0`.
    pub fn positive() -> Self {
        Self::greater_than(0.0)
    }

    /// `v > min`.
    pub fn greater_than(min: f64) -> Self {
        Self {
            min: Some(Bound::open(min)),
            max: None,
        }
    }

    /// `v >= min`.
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(Bound::closed(min)),
            max: None,
        }
    }

    /// Check a single value against the rule.
    pub fn contains(&self, value: f64) -> bool {
        let above_min = match self.min {
            Some(min) if min.inclusive => value >= min.value,
            Some(min) => value > min.value,
            None => true,
        };
        let below_max = match self.max {
            Some(max) if max.inclusive => value <= max.value,
            Some(max) => value < max.value,
            None => true,
        };
        above_min && below_max
    }

    /// Interval notation, e.g. `(0, +inf)` or `[1800, 2026]`.
    pub fn describe(&self) -> String {
        let lower = match self.min {
            Some(b) => format!("{}{}", if b.inclusive { '[' } else { '(' }, b.value),
            None => "(-inf".to_string(),
        };
        let upper = match self.max {
            Some(b) => format!("{}{}", b.value, if b.inclusive { ']' } else { ')' }),
            None => "+inf)".to_string(),
        };
        format!("{}, {}", lower, upper)
    }
}

/// A single advisory finding produced by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// Required columns are absent.
    SchemaViolation { missing_columns: Vec<String> },
    /// A column does not have the expected kind.
    TypeMismatch {
        column: String,
        expected: ColumnKind,
        actual: String,
    },
    /// Some non-null values fall outside a range rule.
    RangeViolation {
        column: String,
        rule: RangeRule,
        violation_count: usize,
        /// Zero-based row indices of the first few violations.
        sample_rows: Vec<usize>,
    },
    /// Fully duplicated rows are present.
    DuplicateRows { count: usize },
    /// A column still contains nulls.
    MissingValues { column: String, count: usize },
}

impl ValidationIssue {
    /// Stable code for the issue kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaViolation { .. } => "SCHEMA_VIOLATION",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::RangeViolation { .. } => "RANGE_VIOLATION",
            Self::DuplicateRows { .. } => "DUPLICATE_ROWS",
            Self::MissingValues { .. } => "MISSING_VALUES",
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> String {
        match self {
            Self::SchemaViolation { missing_columns } => {
                format!("Missing required columns: {:?}", missing_columns)
            }
            Self::TypeMismatch { column, expected, actual } => {
                format!("'{}' should be {:?} but is {}", column, expected, actual)
            }
            Self::RangeViolation { column, rule, violation_count, .. } => format!(
                "'{}' has {} values outside {}",
                column,
                violation_count,
                rule.describe()
            ),
            Self::DuplicateRows { count } => format!("{} duplicate rows found", count),
            Self::MissingValues { column, count } => {
                format!("'{}' has {} missing values", column, count)
            }
        }
    }
}

/// Result of running every validator check against a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows_checked: usize,
    pub columns_checked: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when no issue was found.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues with the given code.
    pub fn count_of(&self, code: &str) -> usize {
        self.issues.iter().filter(|i| i.code() == code).count()
    }
}

// ============================================================================
// Pipeline Summary Types
// ============================================================================

/// Human-readable summary of what the pipeline did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,

    /// Number of duplicate rows removed.
    pub duplicates_removed: usize,

    /// Outlier counts per checked column.
    pub outliers: Vec<OutlierSummary>,

    /// List of actions taken during processing.
    pub actions: Vec<PreprocessingAction>,

    /// Validation of the final table.
    pub validation: ValidationReport,

    /// Where the cleaned table was written, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// Warnings and notes generated during processing.
    pub warnings: Vec<String>,
}

impl PipelineSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action; skipped actions are mirrored into `warnings`.
    pub fn add_action(&mut self, action: PreprocessingAction) {
        if action.action_type == ActionType::Skipped {
            self.warnings.push(action.description.clone());
        }
        self.actions.push(action);
    }

    /// Add several actions.
    pub fn extend_actions(&mut self, actions: impl IntoIterator<Item = PreprocessingAction>) {
        for action in actions {
            self.add_action(action);
        }
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Rows removed between load and export.
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Outlier detection result for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub column: String,
    pub method: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub outlier_count: usize,
}

/// A single action taken during processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (e.g., fill value, strategy used).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PreprocessingAction {
    /// Create a new preprocessing action.
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    /// Add details to the action.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions that can be taken during processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A column was renamed.
    ColumnRenamed,
    /// Formatted text was converted to numbers.
    TypeCorrected,
    /// Missing values were imputed.
    ValueImputed,
    /// Rows were removed because of missing values.
    RowsRemoved,
    /// Duplicate rows were removed.
    DuplicatesRemoved,
    /// Outliers were detected.
    OutliersDetected,
    /// A derived column was added.
    FeatureDerived,
    /// A column was min-max normalized.
    DataNormalized,
    /// Requested work was not done; see the description.
    Skipped,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ColumnRenamed => "Column Renamed",
            Self::TypeCorrected => "Type Corrected",
            Self::ValueImputed => "Value Imputed",
            Self::RowsRemoved => "Rows Removed",
            Self::DuplicatesRemoved => "Duplicates Removed",
            Self::OutliersDetected => "Outliers Detected",
            Self::FeatureDerived => "Feature Derived",
            Self::DataNormalized => "Data Normalized",
            Self::Skipped => "Skipped",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
