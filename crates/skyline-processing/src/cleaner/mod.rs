//! Structural cleaning of the buildings table.
//!
//! This module provides functionality for:
//! - Normalizing column names
//! - Converting scraped numeric text into numbers
//! - Counting and removing duplicate rows

mod converters;

pub use converters::{coerce_numeric, parse_scraped_number};

use crate::error::{ProcessingError, Result};
use crate::types::{ActionType, PreprocessingAction};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Canonical form of a column name: lowercase with spaces as underscores.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Stateless cleaner for the structural stages of the pipeline.
pub struct DataCleaner;

impl DataCleaner {
    /// Lowercase every column name and replace spaces with underscores.
    ///
    /// Applying this twice gives the same names as applying it once. Fails with
    /// [`ProcessingError::DuplicateColumn`] if two columns collapse onto the
    /// same name.
    pub fn normalize_names(df: DataFrame) -> Result<(DataFrame, Vec<PreprocessingAction>)> {
        let mut df = df;
        let mut actions = Vec::new();
        let originals: Vec<String> = crate::utils::column_names(&df);

        let mut seen = HashSet::with_capacity(originals.len());
        for name in &originals {
            let normalized = normalize_name(name);
            if !seen.insert(normalized.clone()) {
                return Err(ProcessingError::DuplicateColumn(normalized));
            }
        }

        for old in originals {
            let new = normalize_name(&old);
            if new == old {
                continue;
            }
            df.rename(&old, new.as_str().into())?;
            debug!("Renamed column '{}' -> '{}'", old, new);
            actions.push(PreprocessingAction::new(
                ActionType::ColumnRenamed,
                &new,
                format!("Renamed '{}' to '{}'", old, new),
            ));
        }

        info!("Normalized column names ({} renamed)", actions.len());
        Ok((df, actions))
    }

    /// Number of rows that are an exact repeat of an earlier row.
    ///
    /// Every column takes part in the comparison and nulls compare equal.
    pub fn count_duplicates(df: &DataFrame) -> Result<usize> {
        if df.height() == 0 || df.width() == 0 {
            return Ok(0);
        }
        let unique = distinct_rows(df)?;
        Ok(df.height() - unique.height())
    }

    /// Drop exact duplicate rows, keeping the first occurrence and the
    /// original row order. Returns the table and the number removed.
    pub fn remove_duplicates(df: DataFrame) -> Result<(DataFrame, usize)> {
        if df.height() == 0 || df.width() == 0 {
            return Ok((df, 0));
        }

        let before = df.height();
        let deduped = distinct_rows(&df)?;
        let removed = before - deduped.height();

        if removed > 0 {
            let pct = (removed as f64 / before as f64) * 100.0;
            info!("Removed {} duplicate rows ({:.1}%)", removed, pct);
        } else {
            debug!("No duplicate rows found");
        }

        Ok((deduped, removed))
    }
}

fn distinct_rows(df: &DataFrame) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(df: &DataFrame) -> Vec<String> {
        crate::utils::column_names(df)
    }

    #[test]
    fn test_normalize_names() {
        let df = df![
            "Building" => ["Burj Khalifa"],
            "Year Completed" => [2010],
            "Height" => [828.0],
        ]
        .unwrap();

        let (df, actions) = DataCleaner::normalize_names(df).unwrap();
        assert_eq!(names(&df), vec!["building", "year_completed", "height"]);
        assert_eq!(actions.len(), 3);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_normalize_names_is_idempotent() {
        let df = df!["City Name" => ["Dubai"], "floors" => [163]].unwrap();
        let (once, _) = DataCleaner::normalize_names(df).unwrap();
        let (twice, actions) = DataCleaner::normalize_names(once.clone()).unwrap();
        assert_eq!(names(&once), names(&twice));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_normalize_names_collision() {
        let df = df!["Height" => [1.0], "height" => [2.0]].unwrap();
        let err = DataCleaner::normalize_names(df).unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_COLUMN");
    }

    #[test]
    fn test_remove_duplicates_keeps_first_in_order() {
        let df = df![
            "building" => ["C", "A", "C", "B", "A"],
            "height" => [Some(3.0), None, Some(3.0), Some(2.0), None],
        ]
        .unwrap();

        let (deduped, removed) = DataCleaner::remove_duplicates(df).unwrap();
        assert_eq!(removed, 2);

        let buildings: Vec<Option<&str>> = deduped
            .column("building")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(buildings, vec![Some("C"), Some("A"), Some("B")]);
    }

    #[test]
    fn test_rows_differing_in_one_column_are_kept() {
        let df = df![
            "building" => ["A", "A"],
            "height" => [1.0, 2.0],
        ]
        .unwrap();
        assert_eq!(DataCleaner::count_duplicates(&df).unwrap(), 0);
        let (deduped, removed) = DataCleaner::remove_duplicates(df).unwrap();
        assert_eq!((deduped.height(), removed), (2, 0));
    }

    #[test]
    fn test_duplicates_on_empty_table() {
        let (df, removed) = DataCleaner::remove_duplicates(DataFrame::empty()).unwrap();
        assert_eq!((df.height(), removed), (0, 0));
    }
}
