//! Cleaner: the fixed, ordered data-quality pass over a loaded dataset.
//!
//! Each step is a `DataFrame -> DataFrame` transformation; deduplication and
//! sentinel replacement run as lazy polars plans. The standard pipeline
//! applies them in this order:
//! 1. drop exact duplicate rows (first occurrence kept)
//! 2. drop columns with no present values
//! 3. replace sentinel numbers with missing
//! 4. coerce time/date-named columns to timestamps
//!
//! Step 3 is deliberately blunt: it removes -999, -9999 and 9999 from every
//! numeric column, even where 9999 could be a real measurement.

use super::timestamp::{epoch_nanos, parse_timestamp};
use crate::dataset::{is_temporal_name, Dataset};
use crate::error::DataError;
use polars::prelude::*;
use tracing::debug;

/// Numeric values that mean "no data".
pub const SENTINELS: [f64; 3] = [-999.0, -9999.0, 9999.0];

/// One transformation of the cleaning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStep {
    Deduplicate,
    DropEmptyColumns,
    ReplaceSentinels,
    CoerceTemporal,
}

impl CleanStep {
    pub fn name(self) -> &'static str {
        match self {
            CleanStep::Deduplicate => "deduplicate",
            CleanStep::DropEmptyColumns => "drop_empty_columns",
            CleanStep::ReplaceSentinels => "replace_sentinels",
            CleanStep::CoerceTemporal => "coerce_temporal",
        }
    }

    pub fn apply(self, frame: DataFrame) -> PolarsResult<DataFrame> {
        match self {
            CleanStep::Deduplicate => deduplicate(frame),
            CleanStep::DropEmptyColumns => drop_empty_columns(frame),
            CleanStep::ReplaceSentinels => replace_sentinels(frame),
            CleanStep::CoerceTemporal => coerce_temporal(frame),
        }
    }
}

/// An ordered list of cleaning steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningPipeline {
    steps: Vec<CleanStep>,
}

impl CleaningPipeline {
    /// The standard four-step pipeline.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                CleanStep::Deduplicate,
                CleanStep::DropEmptyColumns,
                CleanStep::ReplaceSentinels,
                CleanStep::CoerceTemporal,
            ],
        }
    }

    pub fn steps(&self) -> &[CleanStep] {
        &self.steps
    }

    pub fn run(&self, dataset: Dataset) -> Result<Dataset, DataError> {
        let mut frame = dataset.into_frame();
        for step in &self.steps {
            let (rows, cols) = (frame.height(), frame.width());
            frame = step.apply(frame)?;
            debug!(
                step = step.name(),
                rows_before = rows,
                rows_after = frame.height(),
                columns_before = cols,
                columns_after = frame.width(),
                "clean step applied"
            );
        }
        Ok(Dataset::from_normalized(frame))
    }
}

impl Default for CleaningPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run the standard cleaning pipeline.
pub fn clean(dataset: Dataset) -> Result<Dataset, DataError> {
    CleaningPipeline::standard().run(dataset)
}

/// Keep the first occurrence of every distinct row, preserving order.
pub fn deduplicate(frame: DataFrame) -> PolarsResult<DataFrame> {
    if frame.width() == 0 {
        return Ok(frame);
    }
    let subset = frame
        .get_columns()
        .iter()
        .map(|c| c.name().as_str().into())
        .collect();
    frame
        .lazy()
        .unique_stable(Some(subset), UniqueKeepStrategy::First)
        .collect()
}

/// Remove columns in which every value is missing.
pub fn drop_empty_columns(frame: DataFrame) -> PolarsResult<DataFrame> {
    let keep: Vec<PlSmallStr> = frame
        .get_columns()
        .iter()
        .filter(|c| c.null_count() < c.len())
        .map(|c| c.name().clone())
        .collect();
    if keep.len() == frame.width() {
        return Ok(frame);
    }
    frame.select(keep)
}

/// Replace sentinel numbers with missing in every numeric column.
pub fn replace_sentinels(frame: DataFrame) -> PolarsResult<DataFrame> {
    let exprs: Vec<Expr> = frame
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::Float64)
        .map(|c| {
            let name = c.name().clone();
            let is_sentinel = SENTINELS
                .iter()
                .map(|&s| col(name.clone()).eq(lit(s)))
                .reduce(|a, b| a.or(b))
                .unwrap_or_else(|| lit(false));
            when(is_sentinel)
                .then(lit(NULL))
                .otherwise(col(name.clone()))
                .cast(DataType::Float64)
                .alias(name)
        })
        .collect();
    if exprs.is_empty() {
        return Ok(frame);
    }
    frame.lazy().with_columns(exprs).collect()
}

/// Convert every time/date-named column to nanosecond timestamps.
///
/// Text is parsed leniently. Numbers are read as nanoseconds since the
/// Unix epoch. Values that fail to convert become missing; this step
/// never fails on data.
pub fn coerce_temporal(frame: DataFrame) -> PolarsResult<DataFrame> {
    let needs_coercion = |c: &Column| {
        is_temporal_name(c.name()) && !matches!(c.dtype(), DataType::Datetime(_, _))
    };
    if !frame.get_columns().iter().any(needs_coercion) {
        return Ok(frame);
    }
    let columns = frame
        .get_columns()
        .iter()
        .map(|c| {
            if needs_coercion(c) {
                to_datetime(c)
            } else {
                Ok(c.clone())
            }
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

fn to_datetime(column: &Column) -> PolarsResult<Column> {
    let nanos: Vec<Option<i64>> = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| {
                v.and_then(parse_timestamp)
                    .and_then(|t| t.and_utc().timestamp_nanos_opt())
            })
            .collect(),
        DataType::Float64 => column.f64()?.iter().map(|v| v.and_then(epoch_nanos)).collect(),
        _ => vec![None; column.len()],
    };
    Column::new(column.name().clone(), nanos)
        .cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    fn argo_sample() -> Dataset {
        Dataset::new(
            df!(
                "Depth" => &[0.0, 0.0, 10.0],
                "Temperature" => &[20.5, 20.5, -9999.0],
                "Salinity" => &[35.1, 35.1, 35.0],
                "Time" => &["2025-01-01", "2025-01-01", "2025-01-02"],
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn numbers(frame: &DataFrame, name: &str) -> Vec<Option<f64>> {
        frame.column(name).unwrap().f64().unwrap().iter().collect()
    }

    fn times(frame: &DataFrame, name: &str) -> Vec<Option<NaiveDateTime>> {
        let column = frame.column(name).unwrap();
        assert_eq!(column.dtype(), &DataType::Datetime(TimeUnit::Nanoseconds, None));
        column
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .iter()
            .map(|v| v.map(|n| DateTime::from_timestamp_nanos(n).naive_utc()))
            .collect()
    }

    #[test]
    fn standard_order_is_fixed() {
        assert_eq!(
            CleaningPipeline::standard().steps(),
            &[
                CleanStep::Deduplicate,
                CleanStep::DropEmptyColumns,
                CleanStep::ReplaceSentinels,
                CleanStep::CoerceTemporal,
            ]
        );
    }

    #[test]
    fn argo_sample_is_cleaned() {
        let cleaned = clean(argo_sample()).unwrap();

        assert_eq!(cleaned.row_count(), 2);
        assert_eq!(numbers(cleaned.frame(), "Temperature"), vec![Some(20.5), None]);
        assert_eq!(cleaned.kind("Time"), Some(ColumnKind::Temporal));
        assert_eq!(
            times(cleaned.frame(), "Time")[1],
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn deduplicate_keeps_first_occurrence_in_order() {
        let frame = df!(
            "Depth" => &[Some(5.0), Some(1.0), Some(5.0), None, None],
            "Id" => &[Some("a"), Some("b"), Some("a"), None, None],
        )
        .unwrap();

        let out = deduplicate(frame).unwrap();
        assert_eq!(numbers(&out, "Depth"), vec![Some(5.0), Some(1.0), None]);
    }

    #[test]
    fn drop_empty_columns_only_drops_fully_missing() {
        let frame = df!(
            "Oxygen" => &[None::<f64>, None],
            "Depth" => &[None, Some(3.0)],
            "Note" => &[None::<&str>, None],
        )
        .unwrap();

        let out = drop_empty_columns(frame).unwrap();
        let names: Vec<&str> = out.get_columns().iter().map(|c| c.name().as_str()).collect();
        assert_eq!(names, vec!["Depth"]);
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn sentinels_become_missing_everywhere_else_untouched() {
        let frame = df!(
            "Pressure" => &[-999.0, 9999.0, -9999.0, 999.0, 9998.5],
            "Flag" => &[Some("-999"), None, None, None, None],
        )
        .unwrap();

        let out = replace_sentinels(frame).unwrap();
        assert_eq!(
            numbers(&out, "Pressure"),
            vec![None, None, None, Some(999.0), Some(9998.5)]
        );
        assert_eq!(out.column("Pressure").unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            out.column("Flag").unwrap().str().unwrap().get(0),
            Some("-999")
        );
    }

    #[test]
    fn temporal_coercion_degrades_bad_values_to_missing() {
        let frame = df!(
            "DATE_QC" => &[Some("2025-03-01"), Some("garbage")],
            "juld_time" => &[Some(0.0), None],
            "Platform" => &[Some("2025-03-01"), Some("x")],
        )
        .unwrap();

        let out = coerce_temporal(frame).unwrap();
        let date = times(&out, "DATE_QC");
        assert!(date[0].is_some());
        assert!(date[1].is_none());

        let epoch = times(&out, "juld_time");
        assert_eq!(
            epoch,
            vec![NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0), None]
        );

        assert_eq!(out.column("Platform").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn numeric_time_values_are_epoch_nanoseconds() {
        let frame = df!("Time" => &[1_735_689_600.0]).unwrap();

        let out = coerce_temporal(frame).unwrap();
        assert_eq!(
            times(&out, "Time"),
            vec![NaiveDate::from_ymd_opt(1970, 1, 1)
                .unwrap()
                .and_hms_nano_opt(0, 0, 1, 735_689_600)]
        );
    }

    #[test]
    fn cleaning_a_clean_dataset_is_a_no_op() {
        let once = clean(argo_sample()).unwrap();
        let twice = clean(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn does_not_touch_the_caller_copy() {
        let original = argo_sample();
        let snapshot = original.clone();
        let _ = clean(original.clone()).unwrap();
        assert_eq!(original, snapshot);
    }
}
