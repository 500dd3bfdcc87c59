//! Report generation module.
//!
//! A [`CleaningReport`] combines the pipeline summary with a profile of the
//! cleaned table. It is used for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use skyline_processing::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report("data/buildings.csv", &result)?;
//! ReportGenerator::write_report(&report, "output/buildings_report.json")?;
//! ```

mod generator;

pub use generator::{CleaningReport, ProcessingSummaryReport, ReportGenerator};
