//! Depth profiles: one parameter against depth, ordered from the surface down.
//!
//! This is the shape the chart and query collaborators consume: the plot
//! draws the points, the responder reads the surface and deepest values.

use crate::dataset::Dataset;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Column used for depth when none is specified.
pub const DEFAULT_DEPTH_COLUMN: &str = "Depth";

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("parameter '{name}' not found. Available columns: {}", available.join(", "))]
    UnknownColumn {
        name: String,
        available: Vec<String>,
    },

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub depth: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthProfile {
    pub parameter: String,
    pub depth_column: String,
    /// Sorted by depth ascending; equal depths keep dataset order.
    pub points: Vec<ProfilePoint>,
}

impl DepthProfile {
    /// Shallowest point.
    pub fn surface(&self) -> Option<&ProfilePoint> {
        self.points.first()
    }

    /// Deepest point.
    pub fn deepest(&self) -> Option<&ProfilePoint> {
        self.points.last()
    }
}

/// Extract `(depth, value)` pairs for `parameter`, skipping rows where either is missing.
pub fn depth_profile(
    dataset: &Dataset,
    depth_column: &str,
    parameter: &str,
) -> Result<DepthProfile, ProfileError> {
    let (depth_name, depth) = numeric_column(dataset, depth_column)?;
    let (value_name, values) = numeric_column(dataset, parameter)?;

    let mut points: Vec<ProfilePoint> = depth
        .iter()
        .zip(values.iter())
        .filter_map(|(d, v)| Some(ProfilePoint { depth: d?, value: v? }))
        .collect();
    points.sort_by(|a, b| a.depth.total_cmp(&b.depth));

    Ok(DepthProfile {
        parameter: value_name,
        depth_column: depth_name,
        points,
    })
}

fn numeric_column<'a>(
    dataset: &'a Dataset,
    name: &str,
) -> Result<(String, &'a Float64Chunked), ProfileError> {
    let column = find_column(dataset, name).ok_or_else(|| ProfileError::UnknownColumn {
        name: name.to_string(),
        available: dataset.column_names().into_iter().map(String::from).collect(),
    })?;
    let values = column
        .f64()
        .map_err(|_| ProfileError::NotNumeric(column.name().to_string()))?;
    Ok((column.name().to_string(), values))
}

/// Exact name match first, then a case-insensitive one.
fn find_column<'a>(dataset: &'a Dataset, name: &str) -> Option<&'a Column> {
    let frame = dataset.frame();
    frame.column(name).ok().or_else(|| {
        frame
            .get_columns()
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_dataset() -> Dataset {
        Dataset::new(
            df!(
                "Depth" => &[Some(500.0), Some(0.0), None, Some(10.0), Some(0.0)],
                "Temperature" => &[6.2, 20.5, 19.0, 18.1, 20.4],
                "Salinity" => &[Some(34.9), None, Some(35.0), Some(35.0), None],
                "Platform" => &["a", "a", "a", "a", "a"],
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn points_are_sorted_by_depth_with_stable_ties() {
        let profile = depth_profile(&profile_dataset(), "Depth", "Temperature").unwrap();
        let pairs: Vec<(f64, f64)> = profile.points.iter().map(|p| (p.depth, p.value)).collect();
        assert_eq!(
            pairs,
            vec![(0.0, 20.5), (0.0, 20.4), (10.0, 18.1), (500.0, 6.2)]
        );
        assert_eq!(profile.surface().unwrap().value, 20.5);
        assert_eq!(profile.deepest().unwrap().value, 6.2);
    }

    #[test]
    fn rows_with_missing_values_are_skipped() {
        let profile = depth_profile(&profile_dataset(), "Depth", "Salinity").unwrap();
        assert_eq!(profile.points.len(), 2);
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        let profile = depth_profile(&profile_dataset(), "depth", "temperature").unwrap();
        assert_eq!(profile.parameter, "Temperature");
        assert_eq!(profile.depth_column, "Depth");
    }

    #[test]
    fn unknown_parameter_lists_available_columns() {
        let err = depth_profile(&profile_dataset(), "Depth", "Oxygen").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter 'Oxygen' not found. Available columns: Depth, Temperature, Salinity, Platform"
        );
    }

    #[test]
    fn text_parameter_is_rejected() {
        let err = depth_profile(&profile_dataset(), "Depth", "Platform").unwrap_err();
        assert_eq!(err, ProfileError::NotNumeric("Platform".into()));
    }
}
