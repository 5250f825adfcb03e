//! FloatChat Core: ingestion, cleaning and summarization of ARGO float data.
//!
//! The pipeline is strictly linear:
//! - Fetcher: download a remote CSV/JSON resource into a local file cache
//! - Loader: parse the cached file into a polars-backed dataset
//! - Cleaner: deduplicate, drop empty columns, null sentinels, coerce timestamps
//! - Summarizer: per-column min/max/mean and time coverage
//! - Reporter: deterministic text rendering of the summary
//!
//! Depth profiles for plotting and question answering are built from the
//! cleaned dataset.

pub mod data;
pub mod dataset;
pub mod error;
pub mod profile;
pub mod report;
pub mod summary;

pub use data::{clean, load, CleanStep, CleaningPipeline, Fetcher, FileCache, SourceFormat};
pub use dataset::{ColumnKind, Dataset};
pub use error::{DataError, FetchCause};
pub use profile::{depth_profile, DepthProfile, ProfileError};
pub use report::render;
pub use summary::{summarize, ColumnStats, ColumnSummary, DatasetSummary, TimeRange};
