use crate::error::Result;
use crate::pipeline::PipelineResult;
use crate::profiler::DataProfiler;
use crate::types::{DatasetProfile, OutlierSummary, PipelineSummary, ValidationReport};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Report for one cleaning run, written by `--emit-report` and printed by
/// `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the output file (if written)
    pub output_file: Option<String>,
    /// Row and column counts plus timing
    pub processing_summary: ProcessingSummaryReport,
    /// Descriptions of every action taken, in order
    pub actions: Vec<String>,
    pub outliers: Vec<OutlierSummary>,
    pub validation: ValidationReport,
    pub warnings: Vec<String>,
    /// Profile of the cleaned table
    pub final_profile: DatasetProfile,
}

/// Headline numbers of a cleaning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummaryReport {
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub rows_removed_percent: f64,
    pub columns_before: usize,
    pub columns_after: usize,
    pub duplicates_removed: usize,
    pub issues_found: usize,
}

impl From<&PipelineSummary> for ProcessingSummaryReport {
    fn from(summary: &PipelineSummary) -> Self {
        let rows_removed = summary.rows_removed();
        Self {
            duration_ms: summary.duration_ms,
            rows_before: summary.rows_before,
            rows_after: summary.rows_after,
            rows_removed,
            rows_removed_percent: if summary.rows_before > 0 {
                (rows_removed as f64 / summary.rows_before as f64) * 100.0
            } else {
                0.0
            },
            columns_before: summary.columns_before,
            columns_after: summary.columns_after,
            duplicates_removed: summary.duplicates_removed,
            issues_found: summary.validation.issues.len(),
        }
    }
}

/// Builds and writes cleaning reports.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Build a report from a finished pipeline run.
    pub fn build_report(input_file: &str, result: &PipelineResult) -> Result<CleaningReport> {
        let summary = &result.summary;
        Ok(CleaningReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: summary.output_path.clone(),
            processing_summary: ProcessingSummaryReport::from(summary),
            actions: summary
                .actions
                .iter()
                .map(|a| format!("[{}] {}", a.action_type.display_name(), a.description))
                .collect(),
            outliers: summary.outliers.clone(),
            validation: summary.validation.clone(),
            warnings: summary.warnings.clone(),
            final_profile: DataProfiler::profile(&result.data)?,
        })
    }

    /// Write a report as pretty-printed JSON, creating parent directories.
    pub fn write_report(report: &CleaningReport, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", path.display());
        Ok(())
    }
}
