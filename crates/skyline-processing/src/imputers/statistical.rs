//! Statistical handling of missing values.
//!
//! Provides mean, median and mode imputation plus row dropping.

use crate::config::MissingStrategy;
use crate::error::Result;
use crate::types::{ActionType, PreprocessingAction};
use crate::utils::{self, column_series, ensure_columns, is_integer_dtype, is_numeric_dtype};
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, info, warn};

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Apply `strategy` to each of `columns` in order (every column when `None`).
    ///
    /// Columns without nulls are left untouched. Mean and median on a text
    /// column, or any fill on an all-null column, leave the column as is and
    /// record a [`ActionType::Skipped`] action.
    pub fn handle_missing(
        df: DataFrame,
        strategy: MissingStrategy,
        columns: Option<&[&str]>,
    ) -> Result<(DataFrame, Vec<PreprocessingAction>)> {
        let targets: Vec<String> = match columns {
            Some(cols) => {
                ensure_columns(&df, cols)?;
                cols.iter().map(|c| c.to_string()).collect()
            }
            None => utils::column_names(&df),
        };

        let mut df = df;
        let mut actions = Vec::new();

        for column in &targets {
            let null_count = column_series(&df, column)?.null_count();
            if null_count == 0 {
                continue;
            }

            let action = match strategy {
                MissingStrategy::Mean | MissingStrategy::Median => {
                    Self::apply_numeric_fill(&mut df, column, strategy)?
                }
                MissingStrategy::Mode => Self::apply_mode_fill(&mut df, column)?,
                MissingStrategy::Drop => Self::apply_drop(&mut df, column)?,
            };
            debug!("{}: {}", column, action.description);
            actions.push(action);
        }

        info!(
            "Handled missing values with '{}' strategy ({} columns affected)",
            strategy,
            actions
                .iter()
                .filter(|a| a.action_type != ActionType::Skipped)
                .count()
        );
        Ok((df, actions))
    }

    fn apply_numeric_fill(
        df: &mut DataFrame,
        column: &str,
        strategy: MissingStrategy,
    ) -> Result<PreprocessingAction> {
        let series = column_series(df, column)?;
        if !is_numeric_dtype(series.dtype()) {
            warn!(
                "Cannot apply '{}' to non-numeric column '{}' ({}), leaving it unchanged",
                strategy,
                column,
                series.dtype()
            );
            return Ok(skipped(
                column,
                format!("'{}' skipped for non-numeric column '{}'", strategy, column),
            ));
        }

        let values = utils::numeric_values(series)?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let fill = match strategy {
            MissingStrategy::Median => utils::median(&present),
            _ => utils::mean(&present),
        };
        let Some(fill) = fill else {
            warn!("Column '{}' has no values to compute a {} from", column, strategy);
            return Ok(skipped(
                column,
                format!("'{}' skipped for all-null column '{}'", strategy, column),
            ));
        };

        let missing = values.iter().filter(|v| v.is_none()).count();
        let filled: Vec<Option<f64>> = values.into_iter().map(|v| v.or(Some(fill))).collect();
        df.replace(column, Series::new(column.into(), filled))?;

        Ok(PreprocessingAction::new(
            ActionType::ValueImputed,
            column,
            format!("Filled {} missing values in '{}' with {}", missing, column, strategy),
        )
        .with_details(format!("{} = {:.4}", strategy, fill)))
    }

    fn apply_mode_fill(df: &mut DataFrame, column: &str) -> Result<PreprocessingAction> {
        let series = column_series(df, column)?.clone();
        let dtype = series.dtype().clone();
        let missing = series.null_count();

        let filled: Option<(Series, String)> = if is_integer_dtype(&dtype) {
            let as_int = series.cast(&DataType::Int64)?;
            let values: Vec<Option<i64>> = as_int.i64()?.into_iter().collect();
            first_mode(values.iter().copied()).map(|fill| {
                let data: Vec<Option<i64>> = values.iter().map(|v| v.or(Some(fill))).collect();
                (Series::new(column.into(), data), fill.to_string())
            })
        } else if is_numeric_dtype(&dtype) {
            let values = utils::numeric_values(&series)?;
            first_mode(values.iter().map(|v| v.map(f64::to_bits))).map(|bits| {
                let fill = f64::from_bits(bits);
                let data: Vec<Option<f64>> = values.iter().map(|v| v.or(Some(fill))).collect();
                (Series::new(column.into(), data), fill.to_string())
            })
        } else if dtype == DataType::Boolean {
            let values: Vec<Option<bool>> = series.bool()?.into_iter().collect();
            first_mode(values.iter().copied()).map(|fill| {
                let data: Vec<Option<bool>> = values.iter().map(|v| v.or(Some(fill))).collect();
                (Series::new(column.into(), data), fill.to_string())
            })
        } else {
            let as_text = series.cast(&DataType::String)?;
            let values: Vec<Option<String>> = as_text
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect();
            first_mode(values.iter().cloned()).map(|fill| {
                let data: Vec<Option<String>> =
                    values.iter().map(|v| v.clone().or(Some(fill.clone()))).collect();
                (Series::new(column.into(), data), fill)
            })
        };

        let Some((filled, fill)) = filled else {
            warn!("Column '{}' has no values to compute a mode from", column);
            return Ok(skipped(
                column,
                format!("'mode' skipped for all-null column '{}'", column),
            ));
        };

        df.replace(column, filled.cast(&dtype)?)?;

        Ok(PreprocessingAction::new(
            ActionType::ValueImputed,
            column,
            format!("Filled {} missing values in '{}' with mode", missing, column),
        )
        .with_details(format!("mode = {}", fill)))
    }

    fn apply_drop(df: &mut DataFrame, column: &str) -> Result<PreprocessingAction> {
        let before = df.height();
        let mask = column_series(df, column)?.is_not_null();
        *df = df.filter(&mask)?;
        let removed = before - df.height();

        Ok(PreprocessingAction::new(
            ActionType::RowsRemoved,
            column,
            format!("Dropped {} rows with missing '{}'", removed, column),
        ))
    }
}

fn skipped(column: &str, description: String) -> PreprocessingAction {
    PreprocessingAction::new(ActionType::Skipped, column, description)
}

/// Most frequent non-null value; ties go to the value seen first.
fn first_mode<K, I>(values: I) -> Option<K>
where
    K: Hash + Eq + Clone,
    I: IntoIterator<Item = Option<K>>,
{
    let mut counts: HashMap<K, (usize, usize)> = HashMap::new();
    for (idx, value) in values.into_iter().enumerate() {
        if let Some(value) = value {
            counts.entry(value).or_insert((0, idx)).0 += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        utils::numeric_values(column_series(df, name).unwrap()).unwrap()
    }

    fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        column_series(df, name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_mean_fill() {
        let df = df!["height" => [Some(100.0), None, Some(300.0)]].unwrap();
        let (df, actions) =
            StatisticalImputer::handle_missing(df, MissingStrategy::Mean, None).unwrap();

        assert_eq!(floats(&df, "height"), vec![Some(100.0), Some(200.0), Some(300.0)]);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, ActionType::ValueImputed);
    }

    #[test]
    fn test_median_fill_even_count() {
        let df = df!["floors" => [Some(10), Some(40), None, Some(20), Some(30)]].unwrap();
        let (df, _) =
            StatisticalImputer::handle_missing(df, MissingStrategy::Median, None).unwrap();
        assert_eq!(floats(&df, "floors")[2], Some(25.0));
        assert_eq!(df.height(), 5);
    }

    #[test]
    fn test_mode_breaks_ties_by_first_occurrence() {
        let df = df![
            "city" => [Some("Dubai"), Some("Shanghai"), None, Some("Shanghai"), Some("Dubai")]
        ]
        .unwrap();
        let (df, _) = StatisticalImputer::handle_missing(df, MissingStrategy::Mode, None).unwrap();
        assert_eq!(strings(&df, "city")[2].as_deref(), Some("Dubai"));
    }

    #[test]
    fn test_mode_keeps_integer_dtype() {
        let df = df!["floors" => [Some(5i64), Some(7), Some(7), None]].unwrap();
        let (df, _) = StatisticalImputer::handle_missing(df, MissingStrategy::Mode, None).unwrap();
        let column = column_series(&df, "floors").unwrap();
        assert_eq!(column.dtype(), &DataType::Int64);
        assert_eq!(floats(&df, "floors")[3], Some(7.0));
    }

    #[test]
    fn test_mode_leaves_large_integers_exact() {
        let big = 9_007_199_254_740_993i64;
        let df = df!["floors" => [Some(big), Some(big), None, Some(1)]].unwrap();
        let (df, _) = StatisticalImputer::handle_missing(df, MissingStrategy::Mode, None).unwrap();

        let floors: Vec<Option<i64>> = column_series(&df, "floors")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(floors, vec![Some(big), Some(big), Some(big), Some(1)]);
    }

    #[test]
    fn test_drop_is_progressive_in_caller_order() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "b" => [None, Some(2.0), Some(3.0), None],
            "c" => [Some(1.0), Some(2.0), None, Some(4.0)],
        ]
        .unwrap();

        let (out, actions) =
            StatisticalImputer::handle_missing(df, MissingStrategy::Drop, Some(&["a", "b"]))
                .unwrap();

        assert_eq!(out.height(), 1);
        assert_eq!(floats(&out, "c"), vec![None]);
        assert_eq!(actions[0].description, "Dropped 1 rows with missing 'a'");
        assert_eq!(actions[1].description, "Dropped 2 rows with missing 'b'");
    }

    #[test]
    fn test_mean_on_text_column_is_skipped() {
        let df = df!["city" => [Some("Dubai"), None]].unwrap();
        let (out, actions) =
            StatisticalImputer::handle_missing(df, MissingStrategy::Mean, None).unwrap();
        assert_eq!(strings(&out, "city"), vec![Some("Dubai".to_string()), None]);
        assert_eq!(actions[0].action_type, ActionType::Skipped);
    }

    #[test]
    fn test_all_null_column_is_skipped() {
        let df = df!["lat" => [None::<f64>, None]].unwrap();
        let (out, actions) =
            StatisticalImputer::handle_missing(df, MissingStrategy::Median, None).unwrap();
        assert_eq!(out.column("lat").unwrap().null_count(), 2);
        assert_eq!(actions[0].action_type, ActionType::Skipped);
    }

    #[test]
    fn test_complete_columns_untouched() {
        let df = df![
            "height" => [Some(1.0), None],
            "floors" => [3i64, 4],
        ]
        .unwrap();
        let (out, actions) =
            StatisticalImputer::handle_missing(df, MissingStrategy::Mean, None).unwrap();
        assert_eq!(column_series(&out, "floors").unwrap().dtype(), &DataType::Int64);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].target, "height");
    }

    #[test]
    fn test_unknown_column() {
        let df = df!["height" => [1.0]].unwrap();
        let err = StatisticalImputer::handle_missing(df, MissingStrategy::Mean, Some(&["nope"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_first_mode() {
        assert_eq!(first_mode(vec![Some(2), Some(1), Some(1), Some(2)]), Some(2));
        assert_eq!(first_mode(vec![None::<i32>, None]), None);
    }
}
