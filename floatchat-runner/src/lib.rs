//! FloatChat Runner: pipeline orchestration and configuration.
//!
//! Builds on `floatchat-core` to provide:
//! - TOML configuration for the fetch cache and report format
//! - The end-to-end pipeline over a URL or a local file

pub mod config;
pub mod pipeline;

pub use config::{ConfigError, FetchConfig, PipelineConfig, ReportConfig, ReportFormat};
pub use pipeline::{Pipeline, PipelineOutput, Source};
