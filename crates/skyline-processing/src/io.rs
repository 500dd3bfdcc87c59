//! Loading and exporting tables as CSV.
//!
//! Loading tries progressively more forgiving readers so that scraped files
//! with stray quotes or blank lines still come through.

use crate::error::{ProcessingError, Result, ResultExt};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read a CSV file with a header row into a table.
///
/// A file with no content yields an empty table. Columns are typed by
/// scanning every row, so a single non-numeric cell keeps a column as text.
pub fn load(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ProcessingError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        warn!("Input file {} is empty", path.display());
        return Ok(DataFrame::empty());
    }

    let df = load_with_fallbacks(path, &content)?;
    info!(
        "Loaded {} rows and {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn load_with_fallbacks(path: &Path, content: &str) -> Result<DataFrame> {
    // Quoted fields, full-table schema inference
    match CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard CSV loading failed: {}", e),
    }

    // Truncate ragged rows, null out unparseable cells
    match CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_ignore_errors(true)
        .with_parse_options(CsvParseOptions::default().with_truncate_ragged_lines(true))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => {
            warn!("Loaded {} after truncating ragged rows", path.display());
            return Ok(df);
        }
        Err(e) => debug!("Lenient CSV loading failed: {}", e),
    }

    // Pre-clean the raw text
    let cleaned = clean_csv_content(content);
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .context(format!("Reading {}", path.display()))
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `df` as CSV with a header row and no index column.
///
/// Missing parent directories are created. An existing file is overwritten.
pub fn export(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    let mut output = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut output)?;

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file() {
        let err = load("/definitely/not/here.csv").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        let df = load(&path).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 0);
    }

    #[test]
    fn test_load_infers_types_from_every_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.csv");
        fs::write(&path, "Building,Height\nA,828\nB,632\nC,N/A\n").unwrap();

        let df = load(&path).unwrap();
        assert_eq!(df.shape(), (3, 2));
        assert_eq!(df.column("Height").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_load_truncates_ragged_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "a,b\n1,2\n3\n4,5,6\n").unwrap();

        let df = load(&path).unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_export_creates_parent_dirs_and_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/cleaned.csv");
        let df = df![
            "building" => ["Burj Khalifa", "Shanghai Tower"],
            "height" => [Some(828.0), None],
        ]
        .unwrap();

        export(&df, &path).unwrap();
        let back = load(&path).unwrap();

        assert_eq!(back.shape(), (2, 2));
        let heights: Vec<Option<f64>> = back
            .column("height")
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(heights, vec![Some(828.0), None]);
    }

    #[test]
    fn test_clean_csv_content() {
        let raw = "a,b\n\n1,\"\"x\"\"\n";
        assert_eq!(clean_csv_content(raw), "a,b\n1,\"x\"");
    }
}
