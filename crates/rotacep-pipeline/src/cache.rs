//! Per-city geocode cache.
//!
//! Geocoding a whole city costs hundreds of rate-limited network calls,
//! so the finished map is persisted as one JSON file per (state, city)
//! pair and reused forever. Entries never expire; deleting the file is
//! the only eviction path. Writes are whole-file replacements, so a
//! concurrent resolution race wastes network work but cannot corrupt an
//! entry.

use std::future::Future;
use std::path::{Path, PathBuf};

use rotacep_core::GeocodeRecord;

use crate::error::PipelineError;

pub struct CityGeocodeCache {
    dir: PathBuf,
}

impl CityGeocodeCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache file for a (state, city) pair. File existence is the
    /// sole cache-hit signal.
    #[must_use]
    pub fn entry_path(&self, state: &str, city: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.json", slug(state), slug(city)))
    }

    /// Returns the stored records, or `None` on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if an existing entry cannot be read or
    /// parsed; delete the entry to recover.
    pub fn load(
        &self,
        state: &str,
        city: &str,
    ) -> Result<Option<Vec<GeocodeRecord>>, PipelineError> {
        let path = self.entry_path(state, city);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        let records: Vec<GeocodeRecord> =
            serde_json::from_str(&content).map_err(|e| PipelineError::CacheFormat {
                path: path.display().to_string(),
                source: e,
            })?;
        Ok(Some(records))
    }

    /// Persists the records for a (state, city) pair, replacing any
    /// previous entry.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` on I/O failure.
    pub fn store(
        &self,
        state: &str,
        city: &str,
        records: &[GeocodeRecord],
    ) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.entry_path(state, city);
        let content = serde_json::to_string_pretty(records).map_err(|e| {
            PipelineError::CacheFormat {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        std::fs::write(&path, content).map_err(|e| io_error(&path, e))?;
        Ok(())
    }

    /// Deletes the entry for a (state, city) pair. Returns whether an
    /// entry existed.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` on I/O failure other than the entry being
    /// absent.
    pub fn invalidate(&self, state: &str, city: &str) -> Result<bool, PipelineError> {
        let path = self.entry_path(state, city);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// Returns the cached records for a city, resolving and persisting
    /// them on a miss.
    ///
    /// The expensive resolve closure runs at most once per distinct
    /// (state, city) pair across every caller sharing the cache
    /// directory. An empty resolution is returned but not persisted, so
    /// a city that temporarily yields nothing is retried on the next
    /// run.
    ///
    /// # Errors
    ///
    /// Propagates cache I/O failures and whatever the resolve closure
    /// returns.
    pub async fn get_or_resolve<E, F, Fut>(
        &self,
        state: &str,
        city: &str,
        resolve: F,
    ) -> Result<Vec<GeocodeRecord>, E>
    where
        E: From<PipelineError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<GeocodeRecord>, E>>,
    {
        if let Some(records) = self.load(state, city).map_err(E::from)? {
            tracing::info!(state, city, count = records.len(), "city map cache hit");
            return Ok(records);
        }

        tracing::info!(state, city, "city map cache miss; resolving");
        let records = resolve().await?;
        if records.is_empty() {
            tracing::warn!(state, city, "empty city map is not persisted");
        } else {
            self.store(state, city, &records).map_err(E::from)?;
            tracing::info!(state, city, count = records.len(), "city map persisted");
        }
        Ok(records)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::CacheIo {
        path: path.display().to_string(),
        source,
    }
}

/// Cache keys are lowercase with whitespace collapsed to dashes, so
/// "São Paulo" and "são  paulo" share an entry.
fn slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
