//! Local persistence cache: the on-device mirror of the state document.
//!
//! Written synchronously on every mutation so a device loads instantly and
//! keeps working offline. The cache is a mirror, never a source of truth
//! while the process runs; read failures degrade to "no local data".

use std::path::PathBuf;

use serde_json::Value;

use crate::config::data_dir;
use crate::error::CacheError;
use crate::model::TrackerData;
use crate::sync::reconcile::{ingest, ReconcileOptions};

const CACHE_FILE: &str = "tracker.json";

/// Durable JSON mirror of [`TrackerData`].
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    /// Cache rooted at the default data directory.
    pub fn new() -> Result<Self, std::io::Error> {
        Ok(Self {
            path: data_dir()?.join(CACHE_FILE),
        })
    }

    /// Cache at an explicit path (tests, embedded hosts).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Raw document, if one is present and readable.
    pub fn read_document(&self) -> Option<Value> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable cache, ignoring");
                None
            }
        }
    }

    /// Cached state ingested through the tolerant reconciliation rule, so an
    /// older on-disk schema still loads. `None` when no usable data exists.
    pub fn read(&self, fallback: &TrackerData, options: &ReconcileOptions) -> Option<TrackerData> {
        self.read_document()
            .map(|doc| ingest(fallback, &doc, options))
    }

    /// Mirror the current state to disk.
    pub fn write(&self, data: &TrackerData) -> Result<(), CacheError> {
        self.write_document(&data.to_document())
    }

    /// Mirror a raw document to disk (used when applying a remote change).
    pub fn write_document(&self, document: &Value) -> Result<(), CacheError> {
        let content = serde_json::to_string(document)?;
        std::fs::write(&self.path, content).map_err(|source| CacheError::WriteFailed {
            path: self.path.clone(),
            source,
        })
    }
}
