use crate::cleaner::DataCleaner;
use crate::config::ValidationRules;
use crate::error::Result;
use crate::types::{ColumnKind, RangeRule, ValidationIssue, ValidationReport};
use crate::utils::{self, get_dtype_category, is_numeric_dtype};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Row indices kept per range violation.
const SAMPLE_ROW_LIMIT: usize = 5;

pub struct Validator;

impl Validator {
    /// Report required columns missing from `df`.
    pub fn validate_schema(df: &DataFrame, required: &[&str]) -> Vec<ValidationIssue> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| df.column(name).is_err())
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Vec::new()
        } else {
            vec![ValidationIssue::SchemaViolation { missing_columns: missing }]
        }
    }

    /// True when every required column is present.
    pub fn has_required_columns(df: &DataFrame, required: &[&str]) -> bool {
        Self::validate_schema(df, required).is_empty()
    }

    /// Report columns whose dtype does not match the expected kind.
    pub fn validate_types(
        df: &DataFrame,
        expectations: &BTreeMap<String, ColumnKind>,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut absent = Vec::new();

        for (column, expected) in expectations {
            match df.column(column) {
                Ok(col) => {
                    if !expected.accepts(get_dtype_category(col.dtype())) {
                        issues.push(ValidationIssue::TypeMismatch {
                            column: column.clone(),
                            expected: *expected,
                            actual: col.dtype().to_string(),
                        });
                    }
                }
                Err(_) => absent.push(column.clone()),
            }
        }

        if !absent.is_empty() {
            issues.push(ValidationIssue::SchemaViolation { missing_columns: absent });
        }
        issues
    }

    /// Report non-null values falling outside each column's range rule.
    ///
    /// A rule on a text column is reported as a type mismatch, since no value
    /// in it can be compared.
    pub fn validate_ranges(
        df: &DataFrame,
        rules: &BTreeMap<String, RangeRule>,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut absent = Vec::new();

        for (column, rule) in rules {
            let Ok(col) = df.column(column) else {
                absent.push(column.clone());
                continue;
            };
            let series = col.as_materialized_series();
            if !is_numeric_dtype(series.dtype()) {
                issues.push(ValidationIssue::TypeMismatch {
                    column: column.clone(),
                    expected: ColumnKind::Numeric,
                    actual: series.dtype().to_string(),
                });
                continue;
            }

            let Ok(values) = utils::numeric_values(series) else {
                continue;
            };
            let violations: Vec<usize> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_some_and(|x| !rule.contains(x)))
                .map(|(idx, _)| idx)
                .collect();

            if !violations.is_empty() {
                issues.push(ValidationIssue::RangeViolation {
                    column: column.clone(),
                    rule: *rule,
                    violation_count: violations.len(),
                    sample_rows: violations.into_iter().take(SAMPLE_ROW_LIMIT).collect(),
                });
            }
        }

        if !absent.is_empty() {
            issues.push(ValidationIssue::SchemaViolation { missing_columns: absent });
        }
        issues
    }

    /// Report fully duplicated rows.
    pub fn validate_uniqueness(df: &DataFrame) -> Result<Vec<ValidationIssue>> {
        let count = DataCleaner::count_duplicates(df)?;
        Ok(if count > 0 {
            vec![ValidationIssue::DuplicateRows { count }]
        } else {
            Vec::new()
        })
    }

    /// Report every column that still holds nulls.
    pub fn validate_missing(df: &DataFrame) -> Vec<ValidationIssue> {
        df.get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| ValidationIssue::MissingValues {
                column: col.name().to_string(),
                count: col.null_count(),
            })
            .collect()
    }

    /// Run every check configured in `rules`.
    pub fn validate(df: &DataFrame, rules: &ValidationRules) -> Result<ValidationReport> {
        let required: Vec<&str> = rules.required_columns.iter().map(String::as_str).collect();

        let mut issues = Self::validate_schema(df, &required);
        if rules.check_missing {
            issues.extend(Self::validate_missing(df));
        }
        issues.extend(
            Self::validate_types(df, &rules.expected_kinds)
                .into_iter()
                .filter(|issue| !matches!(issue, ValidationIssue::SchemaViolation { .. })),
        );
        if rules.check_duplicates {
            issues.extend(Self::validate_uniqueness(df)?);
        }
        issues.extend(
            Self::validate_ranges(df, &rules.ranges)
                .into_iter()
                .filter(|issue| !matches!(issue, ValidationIssue::SchemaViolation { .. })),
        );

        for issue in &issues {
            warn!("Validation: {}", issue.describe());
        }
        info!(
            "Validated {} rows x {} columns: {} issues",
            df.height(),
            df.width(),
            issues.len()
        );

        Ok(ValidationReport {
            rows_checked: df.height(),
            columns_checked: df.width(),
            issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buildings() -> DataFrame {
        df![
            "building" => ["Burj Khalifa", "Old Tower", "Burj Khalifa"],
            "city" => ["Dubai", "Paris", "Dubai"],
            "height" => [828.0, -3.0, 828.0],
            "floors" => [Some(163i64), None, Some(163)],
            "year_completed" => [2010i64, 1750, 2010],
        ]
        .unwrap()
    }

    #[test]
    fn test_validate_schema_reports_missing() {
        let df = buildings();
        let issues = Validator::validate_schema(&df, &["building", "country", "latitude"]);
        assert_eq!(
            issues,
            vec![ValidationIssue::SchemaViolation {
                missing_columns: vec!["country".to_string(), "latitude".to_string()]
            }]
        );
        assert!(Validator::has_required_columns(&df, &["building", "city"]));
        assert!(!Validator::has_required_columns(&df, &["country"]));
    }

    #[test]
    fn test_validate_types() {
        let df = buildings();
        let expectations = BTreeMap::from([
            ("height".to_string(), ColumnKind::Numeric),
            ("city".to_string(), ColumnKind::Numeric),
            ("building".to_string(), ColumnKind::String),
        ]);
        let issues = Validator::validate_types(&df, &expectations);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_validate_ranges() {
        let df = buildings();
        let rules = BTreeMap::from([
            ("height".to_string(), RangeRule::positive()),
            ("floors".to_string(), RangeRule::positive()),
            ("year_completed".to_string(), RangeRule::inclusive(1800.0, 2025.0)),
        ]);
        let issues = Validator::validate_ranges(&df, &rules);

        assert_eq!(
            issues,
            vec![
                ValidationIssue::RangeViolation {
                    column: "height".to_string(),
                    rule: RangeRule::positive(),
                    violation_count: 1,
                    sample_rows: vec![1],
                },
                ValidationIssue::RangeViolation {
                    column: "year_completed".to_string(),
                    rule: RangeRule::inclusive(1800.0, 2025.0),
                    violation_count: 1,
                    sample_rows: vec![1],
                },
            ]
        );
    }

    #[test]
    fn test_range_bounds_inclusivity() {
        let df = df!["year" => [1800i64, 2025]].unwrap();
        let inclusive =
            BTreeMap::from([("year".to_string(), RangeRule::inclusive(1800.0, 2025.0))]);
        assert!(Validator::validate_ranges(&df, &inclusive).is_empty());

        let exclusive =
            BTreeMap::from([("year".to_string(), RangeRule::exclusive(1800.0, 2025.0))]);
        let issues = Validator::validate_ranges(&df, &exclusive);
        assert!(matches!(
            &issues[0],
            ValidationIssue::RangeViolation { violation_count: 2, .. }
        ));
    }

    #[test]
    fn test_range_rule_on_text_column() {
        let df = buildings();
        let rules = BTreeMap::from([("city".to_string(), RangeRule::positive())]);
        let issues = Validator::validate_ranges(&df, &rules);
        assert_eq!(issues[0].code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_uniqueness_and_missing() {
        let df = buildings();
        assert_eq!(
            Validator::validate_uniqueness(&df).unwrap(),
            vec![ValidationIssue::DuplicateRows { count: 1 }]
        );
        assert_eq!(
            Validator::validate_missing(&df),
            vec![ValidationIssue::MissingValues {
                column: "floors".to_string(),
                count: 1
            }]
        );
    }

    #[test]
    fn test_validate_does_not_modify_table() {
        let df = buildings();
        let before = df.clone();
        let report = Validator::validate(&df, &ValidationRules::buildings(2025)).unwrap();

        assert!(df.equals_missing(&before));
        assert!(!report.is_valid());
        assert_eq!(report.rows_checked, 3);
        assert_eq!(report.count_of("SCHEMA_VIOLATION"), 1);
        assert_eq!(report.count_of("RANGE_VIOLATION"), 2);
        assert_eq!(report.count_of("DUPLICATE_ROWS"), 1);
        assert_eq!(report.count_of("MISSING_VALUES"), 1);
    }

    #[test]
    fn test_clean_table_is_valid() {
        let df = df![
            "building" => ["Burj Khalifa"],
            "city" => ["Dubai"],
            "country" => ["UAE"],
            "height" => [828.0],
            "floors" => [163i64],
            "year_completed" => [2010i64],
        ]
        .unwrap();
        let report = Validator::validate(&df, &ValidationRules::buildings(2025)).unwrap();
        assert!(report.is_valid(), "{:?}", report.issues);
    }
}
