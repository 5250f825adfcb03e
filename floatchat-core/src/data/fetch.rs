//! Fetcher: downloads a remote tabular resource into a local file cache.
//!
//! Cache entries are keyed by filename. If the file already exists the
//! network is never touched.
//!
//! The network call sits behind the [`Transport`] trait so the HTTP client
//! can be replaced by a test double.

use crate::error::{DataError, FetchCause};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Filename used when the URL has no usable last path segment.
pub const DEFAULT_FILENAME: &str = "ocean_data.csv";

/// Default bound on a single download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A blocking source of raw response bodies.
pub trait Transport: Send + Sync {
    /// Retrieve the body at `url`, failing on any non-success response.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchCause>;
}

/// HTTP transport backed by a blocking `reqwest` client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchCause> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(FetchCause::Client)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchCause> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status.as_u16()));
        }
        let body = resp.bytes()?;
        Ok(body.to_vec())
    }
}

/// Local directory holding fetched files.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

/// One file in the cache directory.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Relative paths land inside the cache directory; absolute paths are kept.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// Write `bytes` to `path` via a temporary sibling and an atomic rename.
    pub fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), DataError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DataError::cache(parent, e))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".part");
        let tmp_path = PathBuf::from(tmp);

        fs::write(&tmp_path, bytes).map_err(|e| DataError::cache(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::cache(path, e)
        })
    }

    /// Files currently in the cache, sorted by name.
    ///
    /// A missing cache directory is an empty cache.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, DataError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| DataError::cache(&self.dir, e))? {
            let entry = entry.map_err(|e| DataError::cache(&self.dir, e))?;
            let path = entry.path();
            let meta = entry.metadata().map_err(|e| DataError::cache(&path, e))?;
            if !meta.is_file() {
                continue;
            }
            // In-flight downloads are not cache entries yet
            if path.extension().and_then(|e| e.to_str()) == Some("part") {
                continue;
            }
            entries.push(CacheEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Local>::from),
                path,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Derive a cache filename from a URL: last path segment, query and fragment stripped.
pub fn filename_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or("");
    let segment = without_query.rsplit('/').next().unwrap_or("");
    match segment {
        "" | "." | ".." => DEFAULT_FILENAME.to_string(),
        name => name.to_string(),
    }
}

/// Downloads resources into a [`FileCache`], skipping ones already present.
pub struct Fetcher {
    transport: Box<dyn Transport>,
    cache: FileCache,
}

impl Fetcher {
    pub fn new(transport: impl Transport + 'static, cache: FileCache) -> Self {
        Self {
            transport: Box::new(transport),
            cache,
        }
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Return the local path for `url`, downloading it only on a cache miss.
    ///
    /// Fetches targeting the same local path are serialized, so the
    /// existence check and the write cannot interleave within a process.
    pub fn fetch(&self, url: &str, local_path: Option<&Path>) -> Result<PathBuf, DataError> {
        let target = match local_path {
            Some(p) => self.cache.resolve(p),
            None => self.cache.resolve(Path::new(&filename_from_url(url))),
        };

        let lock = path_lock(&target);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if target.exists() {
            info!(path = %target.display(), "file already cached, skipping download");
            return Ok(target);
        }

        info!(url, path = %target.display(), "downloading");
        let body = self.transport.get(url).map_err(|cause| DataError::Fetch {
            url: url.to_string(),
            cause,
        })?;
        self.cache.write_atomic(&target, &body)?;
        debug!(bytes = body.len(), path = %target.display(), "download stored");

        Ok(target)
    }
}

/// Process-wide lock for a single cache path.
fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<PathLocks> = OnceLock::new();
    LOCKS.get_or_init(PathLocks::default).acquire(path)
}

/// One mutex per path. Entries nobody else holds are dropped on the next
/// acquire, so the map only tracks paths with a fetch in flight.
#[derive(Default)]
struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    fn acquire(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
