//! Summary statistics for numeric columns.

use crate::error::Result;
use crate::types::NumericSummary;
use crate::utils::{self, is_numeric_dtype};
use polars::prelude::*;

/// Count, mean, median, sample std, min, max and range of a numeric column.
///
/// Returns `None` for non-numeric columns and for columns without values.
pub(crate) fn numeric_summary(series: &Series) -> Result<Option<NumericSummary>> {
    if !is_numeric_dtype(series.dtype()) {
        return Ok(None);
    }

    let values = utils::non_null_numeric(series)?;
    let (Some(mean), Some(median), Some(std)) = (
        utils::mean(&values),
        utils::median(&values),
        utils::sample_std(&values),
    ) else {
        return Ok(None);
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(Some(NumericSummary {
        count: values.len(),
        mean,
        median,
        std,
        min,
        max,
        range: max - min,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_summary() {
        let series = Series::new("height".into(), &[Some(100.0), None, Some(300.0), Some(200.0)]);
        let summary = numeric_summary(&series).unwrap().unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean, 200.0);
        assert_eq!(summary.median, 200.0);
        assert_eq!(summary.std, 100.0);
        assert_eq!((summary.min, summary.max, summary.range), (100.0, 300.0, 200.0));
    }

    #[test]
    fn test_text_and_empty_columns_have_no_summary() {
        let text = Series::new("city".into(), &["Dubai"]);
        assert!(numeric_summary(&text).unwrap().is_none());

        let empty = Series::new("height".into(), &[None::<f64>, None]);
        assert!(numeric_summary(&empty).unwrap().is_none());
    }
}
