//! Outlier detection module.
//!
//! Contains functions for flagging unusual values in numeric columns. Detection
//! never changes the table; callers decide what to do with flagged rows.

use crate::config::OutlierMethod;
use crate::error::Result;
use crate::types::OutlierSummary;
use crate::utils::{self, column_series};
use polars::prelude::*;
use tracing::debug;

/// IQR fence multiplier.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Z-score beyond which a value is an outlier.
pub const ZSCORE_THRESHOLD: f64 = 3.0;

/// Acceptance interval for a column. Values strictly outside are outliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Flags outliers with the IQR or z-score method.
pub struct OutlierDetector;

impl OutlierDetector {
    /// Acceptance interval for `values` under `method`.
    ///
    /// Returns `None` when nothing can be flagged: no values, or a z-score
    /// over values with zero spread.
    pub fn bounds(values: &[f64], method: OutlierMethod) -> Option<OutlierBounds> {
        match method {
            OutlierMethod::Iqr => {
                let sorted = utils::sorted(values);
                let q1 = utils::quantile_sorted(&sorted, 0.25)?;
                let q3 = utils::quantile_sorted(&sorted, 0.75)?;
                let iqr = q3 - q1;
                Some(OutlierBounds {
                    lower: q1 - IQR_MULTIPLIER * iqr,
                    upper: q3 + IQR_MULTIPLIER * iqr,
                })
            }
            OutlierMethod::ZScore => {
                let mean = utils::mean(values)?;
                let std = utils::population_std(values)?;
                if std == 0.0 {
                    return None;
                }
                Some(OutlierBounds {
                    lower: mean - ZSCORE_THRESHOLD * std,
                    upper: mean + ZSCORE_THRESHOLD * std,
                })
            }
        }
    }

    /// Row mask of outliers in `column`; nulls are never flagged.
    pub fn outlier_mask(
        df: &DataFrame,
        column: &str,
        method: OutlierMethod,
    ) -> Result<(Vec<bool>, Option<OutlierBounds>)> {
        let values = utils::numeric_values(column_series(df, column)?)?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let bounds = Self::bounds(&present, method);

        let mask = match bounds {
            Some(b) => values
                .iter()
                .map(|v| v.is_some_and(|x| b.is_outlier(x)))
                .collect(),
            None => vec![false; values.len()],
        };
        Ok((mask, bounds))
    }

    /// Rows of `df` whose `column` value is an outlier, in table order.
    pub fn detect(df: &DataFrame, column: &str, method: OutlierMethod) -> Result<DataFrame> {
        let (mask, _) = Self::outlier_mask(df, column, method)?;
        let mask = BooleanChunked::from_slice("outlier".into(), &mask);
        Ok(df.filter(&mask)?)
    }

    /// Count outliers in `column` and report the interval used.
    pub fn summarize(
        df: &DataFrame,
        column: &str,
        method: OutlierMethod,
    ) -> Result<OutlierSummary> {
        let (mask, bounds) = Self::outlier_mask(df, column, method)?;
        let outlier_count = mask.iter().filter(|&&m| m).count();
        debug!(
            "Column '{}': {} outliers by {} (bounds {:?})",
            column, outlier_count, method, bounds
        );

        Ok(OutlierSummary {
            column: column.to_string(),
            method: method.to_string(),
            lower_bound: bounds.map(|b| b.lower),
            upper_bound: bounds.map(|b| b.upper),
            outlier_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heights(df: &DataFrame) -> Vec<Option<f64>> {
        utils::numeric_values(column_series(df, "height").unwrap()).unwrap()
    }

    #[test]
    fn test_iqr_flags_only_extreme_value() {
        let df = df!["height" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0]].unwrap();
        let outliers = OutlierDetector::detect(&df, "height", OutlierMethod::Iqr).unwrap();
        assert_eq!(heights(&outliers), vec![Some(100.0)]);
    }

    #[test]
    fn test_iqr_bounds() {
        let bounds = OutlierDetector::bounds(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0], OutlierMethod::Iqr)
            .unwrap();
        assert_eq!(bounds, OutlierBounds { lower: -1.5, upper: 8.5 });
    }

    #[test]
    fn test_zscore_flags_far_value() {
        let mut values = vec![10.0; 20];
        values.push(1000.0);
        let df = df!["height" => values].unwrap();

        let outliers = OutlierDetector::detect(&df, "height", OutlierMethod::ZScore).unwrap();
        assert_eq!(heights(&outliers), vec![Some(1000.0)]);
    }

    #[test]
    fn test_zscore_constant_column_has_no_outliers() {
        let df = df!["height" => [5.0, 5.0, 5.0]].unwrap();
        let outliers = OutlierDetector::detect(&df, "height", OutlierMethod::ZScore).unwrap();
        assert_eq!(outliers.height(), 0);
        assert!(OutlierDetector::bounds(&[5.0, 5.0], OutlierMethod::ZScore).is_none());
    }

    #[test]
    fn test_nulls_never_flagged() {
        let df = df!["height" => [Some(1.0), None, Some(2.0), Some(3.0), Some(50.0)]].unwrap();
        let (mask, _) = OutlierDetector::outlier_mask(&df, "height", OutlierMethod::Iqr).unwrap();
        assert_eq!(mask, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_detect_does_not_modify_input() {
        let df = df!["height" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0]].unwrap();
        let _ = OutlierDetector::detect(&df, "height", OutlierMethod::Iqr).unwrap();
        assert_eq!(df.height(), 6);
    }

    #[test]
    fn test_summarize() {
        let df = df!["height" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0]].unwrap();
        let summary = OutlierDetector::summarize(&df, "height", OutlierMethod::Iqr).unwrap();
        assert_eq!(summary.outlier_count, 1);
        assert_eq!(summary.method, "iqr");
        assert_eq!(summary.upper_bound, Some(8.5));
    }

    #[test]
    fn test_non_numeric_column() {
        let df = df!["city" => ["Dubai", "Taipei"]].unwrap();
        let err = OutlierDetector::detect(&df, "city", OutlierMethod::Iqr).unwrap_err();
        assert_eq!(err.error_code(), "NON_NUMERIC_COLUMN");
    }

    #[test]
    fn test_empty_column() {
        let df = df!["height" => Vec::<f64>::new()].unwrap();
        let outliers = OutlierDetector::detect(&df, "height", OutlierMethod::Iqr).unwrap();
        assert_eq!(outliers.height(), 0);
    }
}
