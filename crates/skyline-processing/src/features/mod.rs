//! Derived columns for the buildings table.
//!
//! Every operation adds a new column and leaves the source column untouched.

use crate::error::{ProcessingError, Result};
use crate::types::{ActionType, PreprocessingAction};
use crate::utils::{self, column_series, is_integer_dtype, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Name of the building age column.
pub const BUILDING_AGE_COLUMN: &str = "building_age";

/// Name of the height category column.
pub const HEIGHT_CATEGORY_COLUMN: &str = "height_category";

/// Suffix appended to a normalized copy of a column.
pub const NORMALIZED_SUFFIX: &str = "_normalized";

/// Height bucket of a building, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightCategory {
    /// Above 0 and below 150.
    Low,
    /// From 150 up to but excluding 300.
    Medium,
    /// From 300 up to and including 600.
    High,
}

impl HeightCategory {
    /// Bucket a height. Zero, negative and above-600 heights are unclassified.
    pub fn classify(height: f64) -> Option<Self> {
        if height <= 0.0 || height.is_nan() {
            None
        } else if height < 150.0 {
            Some(Self::Low)
        } else if height < 300.0 {
            Some(Self::Medium)
        } else if height <= 600.0 {
            Some(Self::High)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for HeightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adds engineered columns to a table.
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Add `building_age = reference_year - year`.
    ///
    /// The new column is Int64 when the year column holds integers and Float64
    /// otherwise. Null years give null ages.
    pub fn derive_building_age(
        df: DataFrame,
        year_column: &str,
        reference_year: i32,
    ) -> Result<(DataFrame, PreprocessingAction)> {
        let mut df = df;
        let series = column_series(&df, year_column)?;

        let age = if is_integer_dtype(series.dtype()) {
            let years = series.cast(&DataType::Int64)?;
            let ages: Vec<Option<i64>> = years
                .i64()?
                .into_iter()
                .map(|y| y.map(|y| i64::from(reference_year) - y))
                .collect();
            Series::new(BUILDING_AGE_COLUMN.into(), ages)
        } else {
            let ages: Vec<Option<f64>> = utils::numeric_values(series)?
                .into_iter()
                .map(|y| y.map(|y| f64::from(reference_year) - y))
                .collect();
            Series::new(BUILDING_AGE_COLUMN.into(), ages)
        };

        df.with_column(age)?;
        debug!("Derived '{}' from '{}'", BUILDING_AGE_COLUMN, year_column);

        let action = PreprocessingAction::new(
            ActionType::FeatureDerived,
            BUILDING_AGE_COLUMN,
            format!("Added '{}' from '{}'", BUILDING_AGE_COLUMN, year_column),
        )
        .with_details(format!("reference year {}", reference_year));
        Ok((df, action))
    }

    /// Add `height_category` with values `Low`, `Medium`, `High` or null.
    pub fn derive_height_category(
        df: DataFrame,
        height_column: &str,
    ) -> Result<(DataFrame, PreprocessingAction)> {
        let mut df = df;
        let heights = utils::numeric_values(column_series(&df, height_column)?)?;

        let categories: Vec<Option<&str>> = heights
            .iter()
            .map(|h| h.and_then(HeightCategory::classify).map(|c| c.as_str()))
            .collect();
        let unclassified = categories
            .iter()
            .zip(&heights)
            .filter(|(c, h)| c.is_none() && h.is_some())
            .count();

        df.with_column(Series::new(HEIGHT_CATEGORY_COLUMN.into(), categories))?;
        debug!(
            "Derived '{}' ({} heights outside every bucket)",
            HEIGHT_CATEGORY_COLUMN, unclassified
        );

        let action = PreprocessingAction::new(
            ActionType::FeatureDerived,
            HEIGHT_CATEGORY_COLUMN,
            format!("Added '{}' from '{}'", HEIGHT_CATEGORY_COLUMN, height_column),
        )
        .with_details(format!("{} heights unclassified", unclassified));
        Ok((df, action))
    }

    /// Add `<column>_normalized = (v - min) / (max - min)`.
    ///
    /// When every value is the same the normalized values are all `0.0`.
    /// Nulls stay null.
    pub fn normalize_column(
        df: DataFrame,
        column: &str,
    ) -> Result<(DataFrame, PreprocessingAction)> {
        let mut df = df;
        let series = column_series(&df, column)?;
        if !is_numeric_dtype(series.dtype()) {
            return Err(ProcessingError::NonNumericColumn {
                column: column.to_string(),
                dtype: series.dtype().to_string(),
            });
        }

        let values = utils::numeric_values(series)?;
        let (min, max) = values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let span = max - min;

        let normalized: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.map(|v| if span > 0.0 { (v - min) / span } else { 0.0 }))
            .collect();

        let name = format!("{}{}", column, NORMALIZED_SUFFIX);
        df.with_column(Series::new(name.as_str().into(), normalized))?;

        let action = PreprocessingAction::new(
            ActionType::DataNormalized,
            &name,
            format!("Min-max normalized '{}' into '{}'", column, name),
        );
        Ok((df, action))
    }
}
