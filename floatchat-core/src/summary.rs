//! Summarizer: per-column statistics and time coverage of a cleaned dataset.

use crate::data::timestamp::{format_timestamp, from_epoch_nanos};
use crate::dataset::{is_temporal_name, Dataset};
use crate::report::format_number;
use polars::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Min, max and mean over the present values of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summary of one numeric column. `stats` is `None` when `valid == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub valid: usize,
    pub stats: Option<ColumnStats>,
}

/// Earliest and latest value of the first time/date column, as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Output contract of the summarizer.
///
/// Serializes as `{"record_count", "time_range"?, "columns": {name: {...}}}`
/// with columns in dataset order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(serialize_with = "columns_as_map")]
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Serialize)]
struct ColumnEntry {
    valid: usize,
    min: Option<f64>,
    max: Option<f64>,
    mean: Option<f64>,
}

fn columns_as_map<S: Serializer>(columns: &[ColumnSummary], s: S) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(columns.len()))?;
    for column in columns {
        let entry = ColumnEntry {
            valid: column.valid,
            min: column.stats.map(|st| st.min),
            max: column.stats.map(|st| st.max),
            mean: column.stats.map(|st| st.mean),
        };
        map.serialize_entry(&column.name, &entry)?;
    }
    map.end()
}

/// Summarize a dataset. Never fails; an empty dataset yields an empty summary.
pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let frame = dataset.frame();
    let columns = frame
        .get_columns()
        .iter()
        .filter_map(|column| {
            let values = column.f64().ok()?;
            Some(ColumnSummary {
                name: column.name().to_string(),
                valid: values.iter().flatten().filter(|x| x.is_finite()).count(),
                stats: numeric_stats(values),
            })
        })
        .collect();

    let time_range = frame
        .get_columns()
        .iter()
        .find(|c| is_temporal_name(c.name()))
        .and_then(time_range);

    DatasetSummary {
        record_count: dataset.row_count(),
        time_range,
        columns,
    }
}

/// Min, max and mean of the finite values, `None` if there are none.
pub fn numeric_stats(values: &Float64Chunked) -> Option<ColumnStats> {
    let finite: Float64Chunked = values
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    let (min, max, mean) = (finite.min()?, finite.max()?, finite.mean()?);
    // Summation error can push the mean a hair outside [min, max]
    Some(ColumnStats {
        min,
        max,
        mean: mean.max(min).min(max),
    })
}

fn time_range(column: &Column) -> Option<TimeRange> {
    let (start, end) = match column.dtype() {
        DataType::Datetime(unit, _) => {
            let scale = match unit {
                TimeUnit::Nanoseconds => 1,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Milliseconds => 1_000_000,
            };
            let physical = column.cast(&DataType::Int64).ok()?;
            let values = physical.i64().ok()?;
            let start = from_epoch_nanos(values.min()?.saturating_mul(scale));
            let end = from_epoch_nanos(values.max()?.saturating_mul(scale));
            (format_timestamp(&start), format_timestamp(&end))
        }
        DataType::Float64 => {
            let stats = numeric_stats(column.f64().ok()?)?;
            (format_number(stats.min), format_number(stats.max))
        }
        DataType::String => {
            let present: Vec<&str> = column.str().ok()?.into_iter().flatten().collect();
            let start = present.iter().min()?;
            let end = present.iter().max()?;
            (start.to_string(), end.to_string())
        }
        _ => return None,
    };
    Some(TimeRange { start, end })
}
