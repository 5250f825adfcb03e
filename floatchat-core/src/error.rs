//! Structured error types for the data pipeline.
//!
//! These are designed to be displayable in CLI output and to keep the
//! underlying cause attached, so callers can report and abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("fetch failed for {url}: {cause}")]
    Fetch {
        url: String,
        #[source]
        cause: FetchCause,
    },

    #[error("unsupported file format '{extension}' (expected csv or json)")]
    UnsupportedFormat { extension: String },

    #[error("cannot parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("cache I/O error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataframe operation failed: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
}

impl DataError {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        DataError::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Cache {
            path: path.into(),
            source,
        }
    }
}

/// Why a download did not produce a body.
#[derive(Debug, Error)]
pub enum FetchCause {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("network unreachable")]
    Network(#[source] reqwest::Error),

    #[error("HTTP client error")]
    Client(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchCause {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FetchCause::Status(status.as_u16())
        } else if e.is_timeout() {
            FetchCause::Timeout(e)
        } else if e.is_connect() || e.is_request() {
            FetchCause::Network(e)
        } else {
            FetchCause::Client(e)
        }
    }
}
