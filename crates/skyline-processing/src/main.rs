//! CLI entry point for the tallest-buildings cleaning pipeline.

use anyhow::{Result, anyhow};
use chrono::Datelike;
use clap::Parser;
use polars::prelude::DataFrame;
use skyline_processing::cleaner::{self, DataCleaner};
use skyline_processing::{
    CleaningReport, DataProfiler, MissingStrategy, OutlierCheck, OutlierDetector, Pipeline,
    PipelineConfig, PipelineConfigBuilder, ProcessingError, ReportGenerator, Validator, io,
    is_numeric_dtype,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cleaning and validation pipeline for the tallest-buildings table",
    long_about = "Loads a scraped tallest-buildings CSV, normalizes column names, converts \
                  formatted numbers, handles missing values, removes duplicates, flags \
                  outliers, derives features and validates the result.\n\n\
                  EXAMPLES:\n  \
                  # Clean with defaults and write the result\n  \
                  skyline-processing -i data/buildings.csv -o output/buildings_cleaned.csv\n\n  \
                  # Median imputation on two columns, z-score outliers on floors\n  \
                  skyline-processing -i data/buildings.csv --strategy median \\\n    \
                  --columns height,floors --outliers floors:zscore\n\n  \
                  # Preview without writing anything\n  \
                  skyline-processing -i data/buildings.csv --dry-run"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the cleaned CSV
    ///
    /// Nothing is written when omitted (unless the config file sets a path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON pipeline configuration; command line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Missing-value strategy (mean, median, mode, drop)
    #[arg(long)]
    strategy: Option<String>,

    /// Columns the missing-value strategy applies to (comma separated)
    ///
    /// Every column is targeted when omitted
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Keep duplicate rows
    #[arg(long)]
    keep_duplicates: bool,

    /// Outlier check as `column` or `column:method` (iqr, zscore); repeatable
    #[arg(long = "outliers")]
    outliers: Vec<String>,

    /// Column to min-max normalize; repeatable
    #[arg(long = "normalize")]
    normalize: Vec<String>,

    /// Year used to compute building age (defaults to the current year)
    #[arg(long)]
    reference_year: Option<i32>,

    /// Do not convert formatted numeric text ("828 m", "1,000")
    #[arg(long)]
    no_coerce: bool,

    /// Preview the loaded table, its profile and validation without writing
    #[arg(long)]
    dry_run: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write the JSON report to this path
    #[arg(short = 'r', long)]
    emit_report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.is_file() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = build_config(&args)?;

    if args.dry_run {
        return run_dry_run(&args, &config);
    }

    run_pipeline(&args, config)
}

/// Merge the optional config file with command line overrides.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PipelineConfig::from_json_file(path)?
        }
        None => PipelineConfig::default(),
    };

    let reference_year = args
        .reference_year
        .or(base.reference_year)
        .unwrap_or_else(|| chrono::Local::now().year());

    let mut builder = PipelineConfigBuilder::from_config(base).reference_year(reference_year);

    if let Some(raw) = &args.strategy {
        match raw.parse::<MissingStrategy>() {
            Ok(strategy) => builder = builder.missing_strategy(strategy),
            Err(e) if e.is_recoverable() => {
                warn!("{}; missing values will be left as they are", e);
                builder = builder.handle_missing(false);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !args.columns.is_empty() {
        builder = builder.missing_columns(args.columns.iter().map(|c| c.trim()));
    }

    if args.keep_duplicates {
        builder = builder.remove_duplicates(false);
    }

    if args.no_coerce {
        builder = builder.coerce_numeric(false);
    }

    if !args.outliers.is_empty() {
        let mut checks = Vec::with_capacity(args.outliers.len());
        for raw in &args.outliers {
            match raw.parse::<OutlierCheck>() {
                Ok(check) => checks.push(check),
                Err(e) if e.is_recoverable() => warn!("Skipping outlier check '{}': {}", raw, e),
                Err(e) => return Err(e.into()),
            }
        }
        builder = builder.outlier_checks(checks);
    }

    if !args.normalize.is_empty() {
        builder = builder.normalize_columns(args.normalize.iter().map(|c| c.trim()));
    }

    if let Some(path) = &args.output {
        builder = builder.output_path(path);
    }

    Ok(builder.build()?)
}

/// Run dry-run mode - show what would happen without processing
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
/// Unlike logging (`info!`, `debug!`), this output should always be visible
/// regardless of log level settings since it's the primary purpose of --dry-run.
fn run_dry_run(args: &Args, config: &PipelineConfig) -> Result<()> {
    info!("Loading dataset from: {}", args.input.display());
    let data = io::load(&args.input)?;
    let (data, renames) = DataCleaner::normalize_names(data)?;
    let data = if config.coerce_numeric {
        coerce_for_preview(data, &config.numeric_columns)?
    } else {
        data
    };

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning actions");
    println!("{}\n", "=".repeat(80));

    // 1. Dataset Overview
    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!("  Renamed columns: {}", renames.len());
    println!();

    // 2. Column profiles
    println!("COLUMN PROFILES");
    println!("{}", "-".repeat(40));

    let profile = DataProfiler::profile(&data)?;

    println!(
        "{:<20} {:<10} {:<10} {:<8} {:>12} {:>12} {:>12}",
        "Column", "Type", "Missing %", "Unique", "Mean", "Min", "Max"
    );
    println!("{}", "-".repeat(88));

    for col in &profile.column_profiles {
        let (mean, min, max) = match &col.numeric {
            Some(stats) => (
                format!("{:.2}", stats.mean),
                format!("{:.2}", stats.min),
                format!("{:.2}", stats.max),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        println!(
            "{:<20} {:<10} {:<10.1} {:<8} {:>12} {:>12} {:>12}",
            truncate_str(&col.name, 19),
            truncate_str(&col.dtype, 9),
            col.null_percentage,
            col.unique_count,
            mean,
            min,
            max
        );
    }
    println!();

    // 3. Cleaning preview
    println!("CLEANING PREVIEW");
    println!("{}", "-".repeat(40));
    if config.handle_missing {
        let targets = match &config.missing_columns {
            Some(cols) => cols.join(", "),
            None => "all columns".to_string(),
        };
        println!(
            "  Missing values: {} on {}",
            config.missing_strategy, targets
        );
    } else {
        println!("  Missing values: left as they are");
    }

    if profile.duplicate_count > 0 {
        let verb = if config.remove_duplicates { "Will remove" } else { "Keeping" };
        println!("  {} {} duplicate rows", verb, profile.duplicate_count);
    } else {
        println!("  No duplicate rows found");
    }

    for check in &config.outlier_checks {
        match data.column(&check.column) {
            Ok(col) if is_numeric_dtype(col.dtype()) => {
                let outliers = OutlierDetector::summarize(&data, &check.column, check.method)?;
                println!(
                    "  Outliers in '{}' by {}: {}",
                    check.column, check.method, outliers.outlier_count
                );
            }
            _ => println!("  Outliers in '{}': column missing or not numeric", check.column),
        }
    }
    println!();

    // 4. Validation
    println!("VALIDATION (before cleaning)");
    println!("{}", "-".repeat(40));
    let report = Validator::validate(&data, &config.effective_validation_rules())?;
    if report.is_valid() {
        println!("  No validation issues");
    } else {
        for issue in &report.issues {
            println!("  - [{}] {}", issue.code(), issue.describe());
        }
    }
    println!();

    // 5. Output files
    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    match &config.output_path {
        Some(path) => println!("  - {}", path.display()),
        None => println!("  - none (pass -o to write the cleaned table)"),
    }
    if let Some(path) = &args.emit_report {
        println!("  - {}", path.display());
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute this cleaning, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Convert numeric text for the preview, leaving unconvertible columns as text.
fn coerce_for_preview(data: DataFrame, columns: &[String]) -> Result<DataFrame> {
    let mut data = data;
    for column in columns {
        if data.column(column).is_err() {
            continue;
        }
        let snapshot = data.clone();
        data = match cleaner::coerce_numeric(data, column) {
            Ok((converted, _)) => converted,
            Err(e @ ProcessingError::NonNumericColumn { .. }) => {
                warn!("{}", e);
                snapshot
            }
            Err(e) => return Err(e.into()),
        };
    }
    Ok(data)
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Run pipeline and print results
fn run_pipeline(args: &Args, config: PipelineConfig) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let pipeline = Pipeline::builder().config(config).build()?;
    let result = pipeline.run(&args.input).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    let report = ReportGenerator::build_report(&args.input.display().to_string(), &result)?;

    if let Some(path) = &args.emit_report {
        ReportGenerator::write_report(&report, path)?;
        info!("Report written to: {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, args.emit_report.as_deref());
    Ok(())
}

/// Print a human-readable summary of the cleaning results.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &CleaningReport, report_path: Option<&Path>) {
    let summary = &report.processing_summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, summary.rows_before, summary.columns_before
    );
    match &report.output_file {
        Some(output_file) => println!(
            "Output: {} ({} rows x {} columns)",
            output_file, summary.rows_after, summary.columns_after
        ),
        None => println!(
            "Output: not written ({} rows x {} columns)",
            summary.rows_after, summary.columns_after
        ),
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed, {:.1}%)",
        summary.rows_before, summary.rows_after, summary.rows_removed, summary.rows_removed_percent
    );
    println!("  Duplicates removed: {}", summary.duplicates_removed);
    println!(
        "  Columns: {} -> {}",
        summary.columns_before, summary.columns_after
    );
    println!();

    if !report.outliers.is_empty() {
        println!("Outliers (rows kept):");
        for outliers in &report.outliers {
            match (outliers.lower_bound, outliers.upper_bound) {
                (Some(lower), Some(upper)) => println!(
                    "  - {} by {}: {} outside [{:.2}, {:.2}]",
                    outliers.column, outliers.method, outliers.outlier_count, lower, upper
                ),
                _ => println!(
                    "  - {} by {}: no bounds computed",
                    outliers.column, outliers.method
                ),
            }
        }
        println!();
    }

    if !report.actions.is_empty() {
        println!("Actions Taken:");
        for action in report.actions.iter().take(10) {
            println!("  - {}", action);
        }
        if report.actions.len() > 10 {
            println!("  ... and {} more actions", report.actions.len() - 10);
        }
        println!();
    }

    println!("Validation:");
    if report.validation.is_valid() {
        println!("  No issues found");
    } else {
        for issue in &report.validation.issues {
            println!("  - [{}] {}", issue.code(), issue.describe());
        }
    }
    println!();

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    if let Some(path) = report_path {
        println!("Report: {}", path.display());
    } else {
        println!("Use --json for machine-readable output");
        println!("Use --emit-report <path> to save the JSON report");
    }
    println!("{}", "=".repeat(80));
}
