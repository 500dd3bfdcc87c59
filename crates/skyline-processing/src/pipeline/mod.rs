//! Pipeline module.
//!
//! This module provides the cleaning pipeline, outlier detection and
//! progress reporting.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use outliers::{OutlierBounds, OutlierDetector};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
