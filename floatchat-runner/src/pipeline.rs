//! Orchestrator: fetch, load, clean, summarize and report, in that order.
//!
//! Stage errors reach the caller unchanged; nothing is retried or wrapped.

use crate::config::{ConfigError, PipelineConfig, ReportFormat};
use floatchat_core::data::{FileCache, Fetcher, HttpTransport, Transport};
use floatchat_core::{
    load, render, summarize, CleaningPipeline, DataError, Dataset, DatasetSummary,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the pipeline reads its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `http://` or `https://` resource, fetched through the cache.
    Remote(String),
    /// File already on disk; no network access.
    Local(PathBuf),
}

impl Source {
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Remote(input.to_string())
        } else {
            Source::Local(PathBuf::from(input))
        }
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub path: PathBuf,
    pub dataset: Dataset,
    pub summary: DatasetSummary,
    /// Rendered text report.
    pub report: String,
}

impl PipelineOutput {
    /// Report in the requested format. JSON is pretty-printed.
    pub fn formatted(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.report.clone()),
            ReportFormat::Json => {
                let mut json = serde_json::to_string_pretty(&self.summary)?;
                json.push('\n');
                Ok(json)
            }
        }
    }
}

pub struct Pipeline {
    fetcher: Fetcher,
    cleaning: CleaningPipeline,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            cleaning: CleaningPipeline::standard(),
        }
    }

    /// Pipeline over an arbitrary transport, caching into `cache_dir`.
    pub fn with_transport(
        transport: impl Transport + 'static,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(Fetcher::new(transport, FileCache::new(cache_dir)))
    }

    /// HTTP-backed pipeline built from a validated config.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = HttpTransport::new(config.timeout(), &config.fetch.user_agent)
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_transport(transport, config.fetch.cache_dir.clone()))
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Run every stage for `source` without printing anything.
    ///
    /// `local_path` names the cache target for remote sources and is
    /// ignored for local ones.
    pub fn execute(
        &self,
        source: &str,
        local_path: Option<&Path>,
    ) -> Result<PipelineOutput, DataError> {
        let path = match Source::parse(source) {
            Source::Remote(url) => self.fetcher.fetch(&url, local_path)?,
            Source::Local(path) => path,
        };

        let raw = load(&path)?;
        let dataset = self.cleaning.run(raw)?;
        let summary = summarize(&dataset);
        let report = render(&summary);

        info!(
            path = %path.display(),
            records = summary.record_count,
            columns = dataset.column_count(),
            "pipeline complete"
        );

        Ok(PipelineOutput {
            path,
            dataset,
            summary,
            report,
        })
    }

    /// Run the pipeline, print the text report to stdout and return the
    /// cleaned dataset with its summary.
    pub fn run(&self, url: &str) -> Result<(Dataset, DatasetSummary), DataError> {
        let output = self.execute(url, None)?;
        print!("{}", output.report);
        Ok((output.dataset, output.summary))
    }
}
