//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the cleaning workflow.

use crate::cleaner::{self, DataCleaner};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::features::FeatureDeriver;
use crate::imputers::StatisticalImputer;
use crate::io;
use crate::pipeline::outliers::OutlierDetector;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::quality::Validator;
use crate::types::{ActionType, PipelineSummary, PreprocessingAction};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Output of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The cleaned table.
    pub data: DataFrame,
    /// What was done to it.
    pub summary: PipelineSummary,
}

/// The cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use skyline_processing::{MissingStrategy, Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .missing_strategy(MissingStrategy::Median)
///     .reference_year(2024)
///     .output_path("output/buildings_cleaned.csv")
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run("data/tallest_buildings.csv")?;
///
/// println!("{} rows left", result.summary.rows_after);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load `path` and process it.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        let path = path.as_ref();
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}...", path.display()),
        ));

        let df = match io::load(path) {
            Ok(df) => df,
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                return Err(e);
            }
        };

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows", df.height()),
        ));
        self.process(df)
    }

    /// Process a table through every configured stage.
    ///
    /// Returns a `PipelineResult` containing the cleaned table and a summary.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage_started(&self, stage: PipelineStage, message: &str) {
        info!("{}", message);
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        info!("Starting cleaning pipeline...");

        let mut summary = PipelineSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();
        if df.height() == 0 {
            warn!("Input table has no rows");
            summary.add_warning("Input table has no rows");
        }

        // Step 1: Column names
        self.stage_started(PipelineStage::Normalizing, "Step 1: Normalizing column names...");
        let (df, renames) = DataCleaner::normalize_names(df)?;
        summary.extend_actions(renames);

        // Step 2: Numeric text
        let df = if self.config.coerce_numeric {
            self.stage_started(PipelineStage::Coercing, "Step 2: Converting numeric text...");
            self.coerce_columns(df, &mut summary)?
        } else {
            info!("Step 2: Skipping numeric conversion (disabled)");
            df
        };

        // Step 3: Missing values
        let df = if self.config.handle_missing {
            self.stage_started(
                PipelineStage::HandlingMissing,
                &format!(
                    "Step 3: Handling missing values ({})...",
                    self.config.missing_strategy
                ),
            );
            let columns: Option<Vec<&str>> = self
                .config
                .missing_columns
                .as_ref()
                .map(|cols| cols.iter().map(String::as_str).collect());
            let (df, actions) = StatisticalImputer::handle_missing(
                df,
                self.config.missing_strategy,
                columns.as_deref(),
            )?;
            summary.extend_actions(actions);
            df
        } else {
            info!("Step 3: Skipping missing-value handling (disabled)");
            df
        };

        // Step 4: Duplicates
        let df = if self.config.remove_duplicates {
            self.stage_started(
                PipelineStage::RemovingDuplicates,
                "Step 4: Removing duplicate rows...",
            );
            let (df, removed) = DataCleaner::remove_duplicates(df)?;
            summary.duplicates_removed = removed;
            if removed > 0 {
                summary.add_action(PreprocessingAction::new(
                    ActionType::DuplicatesRemoved,
                    "dataset",
                    format!("Removed {} duplicate rows", removed),
                ));
            }
            df
        } else {
            info!("Step 4: Keeping duplicate rows (disabled)");
            df
        };

        // Step 5: Outliers
        if !self.config.outlier_checks.is_empty() {
            self.stage_started(PipelineStage::DetectingOutliers, "Step 5: Detecting outliers...");
            self.detect_outliers(&df, &mut summary)?;
        }

        // Step 6: Derived columns
        self.stage_started(PipelineStage::DerivingFeatures, "Step 6: Deriving features...");
        let df = self.derive_features(df, &mut summary)?;

        // Step 7: Validation
        self.stage_started(PipelineStage::Validating, "Step 7: Validating cleaned table...");
        summary.validation = Validator::validate(&df, &self.config.effective_validation_rules())?;

        // Step 8: Export
        if let Some(path) = &self.config.output_path {
            self.stage_started(PipelineStage::Exporting, "Step 8: Writing cleaned table...");
            io::export(&df, path)?;
            summary.output_path = Some(path.display().to_string());
        }

        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Pipeline finished in {}ms: {} -> {} rows, {} validation issues",
            summary.duration_ms,
            summary.rows_before,
            summary.rows_after,
            summary.validation.issues.len()
        );

        Ok(PipelineResult { data: df, summary })
    }

    fn coerce_columns(&self, df: DataFrame, summary: &mut PipelineSummary) -> Result<DataFrame> {
        let mut df = df;
        let total = self.config.numeric_columns.len();

        for (idx, column) in self.config.numeric_columns.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                PipelineStage::Coercing,
                format!("Column: {}", column),
                idx,
                total,
                format!("Converting '{}'", column),
            ));
            if df.column(column).is_err() {
                debug!("Column '{}' not present, nothing to convert", column);
                continue;
            }

            let snapshot = df.clone();
            match cleaner::coerce_numeric(df, column) {
                Ok((converted, action)) => {
                    df = converted;
                    if let Some(action) = action {
                        summary.add_action(action);
                    }
                }
                Err(e @ ProcessingError::NonNumericColumn { .. }) => {
                    warn!("{}", e);
                    summary.add_action(PreprocessingAction::new(
                        ActionType::Skipped,
                        column,
                        format!("Could not convert '{}': {}", column, e),
                    ));
                    df = snapshot;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(df)
    }

    fn detect_outliers(&self, df: &DataFrame, summary: &mut PipelineSummary) -> Result<()> {
        for check in &self.config.outlier_checks {
            if !numeric_column_present(df, &check.column, summary, "outlier detection") {
                continue;
            }

            let outliers = OutlierDetector::summarize(df, &check.column, check.method)?;
            summary.add_action(PreprocessingAction::new(
                ActionType::OutliersDetected,
                &check.column,
                format!(
                    "{} outliers in '{}' by {}",
                    outliers.outlier_count, check.column, check.method
                ),
            ));
            summary.outliers.push(outliers);
        }
        Ok(())
    }

    fn derive_features(&self, df: DataFrame, summary: &mut PipelineSummary) -> Result<DataFrame> {
        let mut df = df;
        let config = &self.config;

        if let Some(year) = config.reference_year
            && numeric_column_present(&df, &config.year_column, summary, "building age")
        {
            let (derived, action) =
                FeatureDeriver::derive_building_age(df, &config.year_column, year)?;
            df = derived;
            summary.add_action(action);
        }

        if config.derive_height_category
            && numeric_column_present(&df, &config.height_column, summary, "height category")
        {
            let (derived, action) =
                FeatureDeriver::derive_height_category(df, &config.height_column)?;
            df = derived;
            summary.add_action(action);
        }

        for column in &config.normalize_columns {
            if !numeric_column_present(&df, column, summary, "normalization") {
                continue;
            }
            let (derived, action) = FeatureDeriver::normalize_column(df, column)?;
            df = derived;
            summary.add_action(action);
        }

        Ok(df)
    }
}

/// Check that `column` exists and is numeric, recording a skipped action
/// when it is not.
fn numeric_column_present(
    df: &DataFrame,
    column: &str,
    summary: &mut PipelineSummary,
    purpose: &str,
) -> bool {
    let reason = match df.column(column) {
        Ok(col) if is_numeric_dtype(col.dtype()) => return true,
        Ok(col) => format!("'{}' is not numeric ({})", column, col.dtype()),
        Err(_) => format!("'{}' is not in the table", column),
    };

    warn!("Skipping {}: {}", purpose, reason);
    summary.add_action(PreprocessingAction::new(
        ActionType::Skipped,
        column,
        format!("Skipped {}: {}", purpose, reason),
    ));
    false
}

/// Builder for creating a [`Pipeline`] with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
