//! Conversion of scraped numeric text into numbers.
//!
//! Scraped tables carry units, thousands separators and footnote markers in
//! numeric cells (`"828 m"`, `"1,000"`, `"2010[3]"`). These columns load as
//! text and are converted here before any numeric stage runs.

use crate::error::{ProcessingError, Result};
use crate::types::{ActionType, PreprocessingAction};
use crate::utils::{is_numeric_dtype, parse_numeric_string};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

static FOOTNOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));

static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("valid regex"));

/// Markers that mean "no value" in scraped tables.
const NULL_MARKERS: [&str; 6] = ["", "-", "—", "n/a", "na", "unknown"];

/// Parse the first number in a scraped cell.
///
/// Footnote markers are removed first so `"2010[3]"` gives 2010 rather than
/// 20103. Returns `None` when the cell holds no number.
pub fn parse_scraped_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if NULL_MARKERS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    let without_notes = FOOTNOTE.replace_all(trimmed, "");
    let matched = FIRST_NUMBER.find(&without_notes)?;
    parse_numeric_string(matched.as_str())
}

/// Convert a text column holding formatted numbers into a numeric column.
///
/// Columns that are already numeric are returned unchanged with no action.
/// The result is Int64 when every parsed value is whole, Float64 otherwise.
/// Cells without a number become null.
pub fn coerce_numeric(
    df: DataFrame,
    column: &str,
) -> Result<(DataFrame, Option<PreprocessingAction>)> {
    let mut df = df;
    let series = crate::utils::column_series(&df, column)?;

    if is_numeric_dtype(series.dtype()) {
        debug!("Column '{}' is already numeric", column);
        return Ok((df, None));
    }
    if series.dtype() != &DataType::String {
        return Err(ProcessingError::NonNumericColumn {
            column: column.to_string(),
            dtype: series.dtype().to_string(),
        });
    }

    let mut parsed: Vec<Option<f64>> = Vec::with_capacity(series.len());
    let mut unparsed = 0usize;
    for cell in series.str()?.into_iter() {
        match cell {
            Some(raw) => {
                let value = parse_scraped_number(raw);
                if value.is_none() && !raw.trim().is_empty() {
                    unparsed += 1;
                }
                parsed.push(value);
            }
            None => parsed.push(None),
        }
    }

    let all_whole = parsed
        .iter()
        .flatten()
        .all(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64);

    let (converted, target) = if all_whole {
        let ints: Vec<Option<i64>> = parsed.iter().map(|v| v.map(|f| f as i64)).collect();
        (Series::new(column.into(), ints), DataType::Int64)
    } else {
        (Series::new(column.into(), parsed), DataType::Float64)
    };
    df.replace(column, converted)?;

    if unparsed > 0 {
        warn!(
            "Column '{}': {} cells held no number and became null",
            column, unparsed
        );
    }

    let action = PreprocessingAction::new(
        ActionType::TypeCorrected,
        column,
        format!("Converted '{}' from text to {}", column, target),
    )
    .with_details(format!("{} unparseable cells set to null", unparsed));

    Ok((df, Some(action)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_scraped_number() {
        assert_eq!(parse_scraped_number("828 m"), Some(828.0));
        assert_eq!(parse_scraped_number("1,000"), Some(1000.0));
        assert_eq!(parse_scraped_number("2010[3]"), Some(2010.0));
        assert_eq!(parse_scraped_number("632.0 m (2,073 ft)"), Some(632.0));
        assert_eq!(parse_scraped_number("approx. 541.3"), Some(541.3));
        assert_eq!(parse_scraped_number("N/A"), None);
        assert_eq!(parse_scraped_number("—"), None);
        assert_eq!(parse_scraped_number("tall"), None);
    }

    #[test]
    fn test_coerce_whole_numbers_to_int() {
        let df = df!["year_completed" => [Some("2010[3]"), Some("2015"), None]].unwrap();
        let (df, action) = coerce_numeric(df, "year_completed").unwrap();

        let column = df.column("year_completed").unwrap();
        assert_eq!(column.dtype(), &DataType::Int64);
        let years: Vec<Option<i64>> = column
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(2010), Some(2015), None]);
        assert_eq!(action.unwrap().action_type, ActionType::TypeCorrected);
    }

    #[test]
    fn test_coerce_fractional_to_float() {
        let df = df!["height" => ["828 m", "541.3 m", "unknown"]].unwrap();
        let (df, _) = coerce_numeric(df, "height").unwrap();

        let heights: Vec<Option<f64>> = df
            .column("height")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(heights, vec![Some(828.0), Some(541.3), None]);
    }

    #[test]
    fn test_numeric_column_untouched() {
        let df = df!["floors" => [163, 128]].unwrap();
        let (out, action) = coerce_numeric(df.clone(), "floors").unwrap();
        assert!(action.is_none());
        assert!(out.equals(&df));
    }

    #[test]
    fn test_missing_column() {
        let df = df!["floors" => [163]].unwrap();
        let err = coerce_numeric(df, "height").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
