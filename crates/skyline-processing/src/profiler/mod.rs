//! Data profiling module for dataset analysis.
//!
//! This module provides a read-only overview of a table: its shape, duplicate
//! rows, and per-column null counts, cardinality, sample values and numeric
//! summary statistics.

mod statistics;

use crate::cleaner::DataCleaner;
use crate::error::Result;
use crate::types::{ColumnProfile, DatasetProfile};
use polars::prelude::*;
use tracing::debug;

/// Number of non-null sample values kept per column.
const SAMPLE_SIZE: usize = 5;

/// Data profiler for analyzing dataset structure and characteristics.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    pub fn profile(df: &DataFrame) -> Result<DatasetProfile> {
        let mut column_profiles = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            column_profiles.push(Self::profile_column(df.height(), col.as_materialized_series())?);
        }

        let duplicate_count = DataCleaner::count_duplicates(df)?;
        let duplicate_percentage = percentage(duplicate_count, df.height());

        debug!(
            "Profiled {} rows x {} columns ({} duplicates)",
            df.height(),
            df.width(),
            duplicate_count
        );

        Ok(DatasetProfile {
            shape: (df.height(), df.width()),
            column_profiles,
            duplicate_count,
            duplicate_percentage,
        })
    }

    fn profile_column(rows: usize, series: &Series) -> Result<ColumnProfile> {
        let null_count = series.null_count();
        let non_null = series.drop_nulls();

        let mut sample_values = Vec::new();
        for idx in 0..non_null.len().min(SAMPLE_SIZE) {
            if let Ok(value) = non_null.get(idx) {
                sample_values.push(match value {
                    AnyValue::String(s) => s.to_string(),
                    other => other.to_string(),
                });
            }
        }

        Ok(ColumnProfile {
            name: series.name().to_string(),
            dtype: series.dtype().to_string(),
            null_count,
            null_percentage: percentage(null_count, rows),
            unique_count: non_null.n_unique()?,
            sample_values,
            numeric: statistics::numeric_summary(series)?,
        })
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile() {
        let df = df![
            "building" => ["A", "B", "A", "C"],
            "height" => [Some(100.0), None, Some(100.0), Some(300.0)],
        ]
        .unwrap();

        let profile = DataProfiler::profile(&df).unwrap();
        assert_eq!(profile.shape, (4, 2));
        assert_eq!(profile.duplicate_count, 1);
        assert_eq!(profile.duplicate_percentage, 25.0);

        let building = &profile.column_profiles[0];
        assert_eq!(building.unique_count, 3);
        assert_eq!(building.sample_values, vec!["A", "B", "A", "C"]);
        assert!(building.numeric.is_none());

        let height = &profile.column_profiles[1];
        assert_eq!(height.null_count, 1);
        assert_eq!(height.null_percentage, 25.0);
        assert_eq!(height.unique_count, 2);
        let summary = height.numeric.as_ref().unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.max, 300.0);
    }

    #[test]
    fn test_profile_empty_table() {
        let profile = DataProfiler::profile(&DataFrame::empty()).unwrap();
        assert_eq!(profile.shape, (0, 0));
        assert!(profile.column_profiles.is_empty());
        assert_eq!(profile.duplicate_percentage, 0.0);
    }
}
