//! The in-memory dataset: a polars `DataFrame` held to a small set of column types.
//!
//! Numeric columns are always `Float64` with finite values only; NaN and
//! infinities count as missing. Text columns are `String`. Temporal columns
//! are `Datetime` and only appear after cleaning.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Resolved type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Float64 => ColumnKind::Numeric,
            DataType::Datetime(_, _) => ColumnKind::Temporal,
            _ => ColumnKind::Text,
        }
    }
}

/// Whether a column name contains `time` or `date`, case-insensitively.
pub fn is_temporal_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("time") || lower.contains("date")
}

/// A loaded table of observations.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Wrap a frame, normalizing its columns.
    ///
    /// Integer and float columns become `Float64` with non-finite values
    /// nulled. String columns whose present values all read as numbers
    /// become `Float64`; NA tokens are matched after trimming. Booleans
    /// become text and all-null columns become numeric.
    pub fn new(frame: DataFrame) -> PolarsResult<Self> {
        if frame.width() == 0 {
            return Ok(Self { frame });
        }
        let columns = frame
            .get_columns()
            .iter()
            .map(normalize_column)
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    /// Wrap a frame whose columns already hold the invariants.
    pub(crate) fn from_normalized(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub(crate) fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| c.name().as_str())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        let column = self.frame.column(name).ok()?;
        Some(ColumnKind::of(column.dtype()))
    }

    /// Values of a numeric column, `None` if absent or not numeric.
    pub fn numeric(&self, name: &str) -> Option<&Float64Chunked> {
        self.frame.column(name).ok()?.f64().ok()
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.column_names() == other.column_names() && self.frame.equals_missing(&other.frame)
    }
}

/// Raw tokens read as missing, in addition to empty cells.
pub const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Whether a raw cell means "no value". Surrounding whitespace is ignored.
pub fn is_missing_token(raw: &str) -> bool {
    let s = raw.trim();
    s.is_empty() || NA_TOKENS.contains(&s)
}

fn normalize_column(column: &Column) -> PolarsResult<Column> {
    let name = column.name().clone();
    match column.dtype() {
        DataType::Float64 => Ok(finite_only(name, column.f64()?)),
        DataType::Float32
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Null => {
            let widened = column.cast(&DataType::Float64)?;
            Ok(finite_only(name, widened.f64()?))
        }
        DataType::Boolean => column.cast(&DataType::String),
        DataType::String => Ok(infer_text(name, column.str()?)),
        _ => Ok(column.clone()),
    }
}

fn finite_only(name: PlSmallStr, values: &Float64Chunked) -> Column {
    let values: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Column::new(name, values)
}

/// Numeric if every present cell parses, text otherwise.
fn infer_text(name: PlSmallStr, values: &StringChunked) -> Column {
    let cells: Vec<Option<&str>> = values
        .into_iter()
        .map(|v| v.filter(|s| !is_missing_token(s)))
        .collect();

    let numbers: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => parse_number(s).map(|x| Some(x).filter(|x| x.is_finite())),
        })
        .collect();

    match numbers {
        Some(numbers) => Column::new(name, numbers),
        None => Column::new(name, cells),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}
