//! Tallest-Buildings Cleaning Library
//!
//! Cleaning, feature derivation and validation for the tallest-buildings
//! table, built on Polars.
//!
//! # Overview
//!
//! The library turns a scraped CSV of the world's tallest buildings into an
//! analysis-ready table:
//!
//! - **Loading and Export**: CSV in, CSV out ([`io`])
//! - **Cleaning**: column name normalization, numeric text conversion,
//!   duplicate removal ([`cleaner`])
//! - **Missing Values**: mean, median, mode or row dropping ([`imputers`])
//! - **Outliers**: IQR and z-score detection ([`pipeline::outliers`])
//! - **Features**: building age, height category, min-max normalization
//!   ([`features`])
//! - **Validation**: required columns, types, ranges, duplicates and nulls,
//!   reported rather than raised ([`quality`])
//! - **Profiling and Reports**: summary statistics and JSON reports
//!
//! Each stage takes a `DataFrame` and returns a new one, so stages can be
//! used on their own or chained by [`Pipeline`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use skyline_processing::{MissingStrategy, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .missing_strategy(MissingStrategy::Mean)
//!     .reference_year(2024)
//!     .output_path("output/tallest_buildings_cleaned.csv")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .build()?
//!     .run("data/tallest_buildings.csv")?;
//!
//! for issue in &result.summary.validation.issues {
//!     println!("{}", issue.describe());
//! }
//! ```
//!
//! # Individual Stages
//!
//! ```rust,ignore
//! use skyline_processing::{io, DataCleaner, OutlierDetector, OutlierMethod};
//!
//! let df = io::load("data/tallest_buildings.csv")?;
//! let (df, _) = DataCleaner::normalize_names(df)?;
//! let (df, removed) = DataCleaner::remove_duplicates(df)?;
//! let tall = OutlierDetector::detect(&df, "height", OutlierMethod::Iqr)?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod features;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::DataCleaner;
pub use config::{
    ConfigValidationError, MissingStrategy, OutlierCheck, OutlierMethod, PipelineConfig,
    PipelineConfigBuilder, ValidationRules,
};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use features::{FeatureDeriver, HeightCategory};
pub use imputers::StatisticalImputer;
pub use pipeline::{
    ClosureProgressReporter, OutlierBounds, OutlierDetector, Pipeline, PipelineBuilder,
    PipelineResult, PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use quality::Validator;
pub use reporting::{CleaningReport, ReportGenerator};
pub use types::{
    ActionType, ColumnKind, ColumnProfile, DatasetProfile, NumericSummary, OutlierSummary,
    PipelineSummary, PreprocessingAction, RangeRule, ValidationIssue, ValidationReport,
};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype};

static_assertions::assert_impl_all!(PipelineConfig: Send, Sync);
static_assertions::assert_impl_all!(PipelineSummary: Send, Sync);
static_assertions::assert_impl_all!(ValidationReport: Send, Sync);
