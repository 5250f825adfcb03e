//! Data acquisition and normalization: fetch → load → clean.

pub mod clean;
pub mod fetch;
pub mod load;
pub mod timestamp;

pub use clean::{clean, CleanStep, CleaningPipeline, SENTINELS};
pub use fetch::{CacheEntry, FileCache, Fetcher, HttpTransport, Transport};
pub use load::{load, SourceFormat};
