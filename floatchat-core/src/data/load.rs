//! Loader: parses a cached file into a typed [`Dataset`].
//!
//! The format is chosen from the file extension alone; unknown extensions
//! are rejected before the file is opened. CSV goes through polars'
//! `LazyCsvReader`, JSON record arrays through `JsonReader`, both with
//! schema inference over every row. Column types are then settled once by
//! [`Dataset::new`].

use crate::dataset::{Dataset, NA_TOKENS};
use crate::error::DataError;
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::info;

/// The closed set of supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Pick a format from the path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            _ => Err(DataError::UnsupportedFormat { extension }),
        }
    }
}

/// Load a CSV or JSON file into a dataset.
pub fn load(path: &Path) -> Result<Dataset, DataError> {
    let format = SourceFormat::from_path(path)?;
    let frame = match format {
        SourceFormat::Csv => read_csv(path)?,
        SourceFormat::Json => read_json(path)?,
    };
    let dataset = Dataset::new(frame).map_err(|e| DataError::parse(path, e))?;
    info!(
        path = %path.display(),
        ?format,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn read_csv(path: &Path) -> Result<DataFrame, DataError> {
    fs::metadata(path).map_err(|e| DataError::cache(path, e))?;

    let null_values: Vec<PlSmallStr> = NA_TOKENS.iter().map(|t| (*t).into()).collect();
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_null_values(Some(NullValues::AllColumns(null_values)))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| DataError::parse(path, e))
}

fn read_json(path: &Path) -> Result<DataFrame, DataError> {
    let bytes = fs::read(path).map_err(|e| DataError::cache(path, e))?;
    if bytes.iter().find(|b| !b.is_ascii_whitespace()) != Some(&b'[') {
        return Err(DataError::parse(
            path,
            "expected a JSON array of row objects",
        ));
    }

    JsonReader::new(Cursor::new(bytes))
        .with_json_format(JsonFormat::Json)
        .infer_schema_len(None)
        .finish()
        .map_err(|e| DataError::parse(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;
    use crate::summary::summarize;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn numbers(ds: &Dataset, name: &str) -> Vec<Option<f64>> {
        ds.numeric(name).unwrap().iter().collect()
    }

    #[test]
    fn csv_types_are_inferred_per_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "argo.csv",
            "Depth,Temperature,Platform,Time\n0,20.5,R1902303,2025-01-01\n10,,R1902303,2025-01-02\n",
        );

        let ds = load(&path).unwrap();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column_names(), vec!["Depth", "Temperature", "Platform", "Time"]);
        assert_eq!(ds.kind("Depth"), Some(ColumnKind::Numeric));
        assert_eq!(ds.kind("Platform"), Some(ColumnKind::Text));
        assert_eq!(ds.kind("Time"), Some(ColumnKind::Text));
        assert_eq!(numbers(&ds, "Depth"), vec![Some(0.0), Some(10.0)]);
        assert_eq!(numbers(&ds, "Temperature"), vec![Some(20.5), None]);
    }

    #[test]
    fn na_tokens_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "na.csv", "Salinity\nNaN\n35.1\nNA\n");

        let ds = load(&path).unwrap();
        assert_eq!(ds.kind("Salinity"), Some(ColumnKind::Numeric));
        assert_eq!(numbers(&ds, "Salinity"), vec![None, Some(35.1), None]);
    }

    #[test]
    fn nan_and_infinity_spellings_load_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "nonfinite.csv",
            "Depth,Salinity,Temperature\n0, NaN,inf\n10,NAN,-inf\n20,35.0,4.5\n",
        );

        let ds = load(&path).unwrap();
        assert_eq!(numbers(&ds, "Salinity"), vec![None, None, Some(35.0)]);
        assert_eq!(numbers(&ds, "Temperature"), vec![None, None, Some(4.5)]);

        let summary = summarize(&ds);
        let salinity = summary.column("Salinity").unwrap();
        assert_eq!(salinity.valid, 1);
        let stats = salinity.stats.unwrap();
        assert_eq!((stats.min, stats.max, stats.mean), (35.0, 35.0, 35.0));
        assert_eq!(summary.column("Temperature").unwrap().valid, 1);
    }

    #[test]
    fn column_of_only_nan_has_no_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "allnan.csv", "Depth,Salinity\n0, NaN\n");

        let summary = summarize(&load(&path).unwrap());
        let salinity = summary.column("Salinity").unwrap();
        assert_eq!(salinity.valid, 0);
        assert_eq!(salinity.stats, None);
    }

    #[test]
    fn extension_match_ignores_case() {
        assert_eq!(
            SourceFormat::from_path(Path::new("PROFILE.CSV")).unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("a/b.Json")).unwrap(),
            SourceFormat::Json
        );
    }

    #[test]
    fn unsupported_extension_is_rejected_without_reading() {
        // The file does not exist: reading it would surface as a Cache error.
        let err = load(Path::new("/definitely/not/here/profile.xml")).unwrap_err();
        match err {
            DataError::UnsupportedFormat { extension } => assert_eq!(extension, "xml"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let err = load(Path::new("argo_sample")).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat { extension } if extension.is_empty()));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataError::Cache { .. }), "unexpected error: {err}");
    }

    #[test]
    fn row_with_extra_fields_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.csv", "Depth,Temperature\n0,20.5\n10,19.0,7\n");
        assert!(matches!(load(&path), Err(DataError::Parse { .. })));
    }

    #[test]
    fn empty_csv_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.csv", "");
        assert!(matches!(load(&path), Err(DataError::Parse { .. })));
    }

    #[test]
    fn header_only_csv_has_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "header.csv", "Depth,Temperature\n");
        let ds = load(&path).unwrap();
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 2);
    }

    #[test]
    fn json_records_with_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "argo.json",
            r#"[
                {"time": "2025-01", "temperature": 20.5, "salinity": 35.1},
                {"time": "2025-02", "temperature": null, "latitude": -8.5},
                {"time": "2025-03", "temperature": 19.8, "salinity": 34.9}
            ]"#,
        );

        let ds = load(&path).unwrap();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column_count(), 4);
        assert_eq!(numbers(&ds, "temperature"), vec![Some(20.5), None, Some(19.8)]);
        assert_eq!(numbers(&ds, "latitude"), vec![None, Some(-8.5), None]);
        assert_eq!(numbers(&ds, "salinity"), vec![Some(35.1), None, Some(34.9)]);
        assert_eq!(ds.kind("time"), Some(ColumnKind::Text));
    }

    #[test]
    fn json_numeric_strings_and_booleans() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "float.json",
            r#"[{"Float": "5906468", "qc_ok": true}, {"Float": "5906469", "qc_ok": false}]"#,
        );

        let ds = load(&path).unwrap();
        assert_eq!(numbers(&ds, "Float"), vec![Some(5906468.0), Some(5906469.0)]);
        assert_eq!(ds.kind("qc_ok"), Some(ColumnKind::Text));
    }

    #[test]
    fn json_that_is_not_an_array_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_array = write(&dir, "obj.json", r#"{"Depth": [0, 10]}"#);
        let malformed = write(&dir, "broken.json", "[{\"Depth\": 0,");

        for path in [not_array, malformed] {
            assert!(
                matches!(load(&path), Err(DataError::Parse { .. })),
                "expected parse error for {}",
                path.display()
            );
        }
    }
}
