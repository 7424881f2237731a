//! # Configuration surface
//!
//! The value struct consumed by `Engine::open`: a data directory and the
//! memtable size threshold that triggers a synchronous flush.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default flush threshold: 2 MiB of accumulated key+value bytes.
pub const DEFAULT_MEMTABLE_SIZE_THRESHOLD: usize = 2 * 1024 * 1024;

/// Errors that can occur while validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `memtable_size_threshold` was zero; a zero threshold would flush on
    /// every single write, which the engine does not treat as a supported mode.
    #[error("memtable_size_threshold must be greater than zero")]
    ZeroThreshold,

    /// `data_dir` (or one of its derived subdirectories) could not be
    /// created or is not writable.
    #[error("data directory {path:?} is not writable: {source}")]
    DirNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Engine configuration: where data lives on disk and when to flush.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory for this engine instance's data. The WAL and on-disk
    /// tables are stored in subdirectories derived from this path.
    pub data_dir: PathBuf,

    /// Accumulated key+value bytes in the active memtable that triggers a
    /// synchronous flush. Defaults to 2 MiB.
    #[serde(default = "default_threshold")]
    pub memtable_size_threshold: usize,

    /// Whether every WAL append is followed by an `fsync`. Defaults to
    /// `true`; callers willing to trade durability for throughput may
    /// disable it.
    #[serde(default = "default_wal_sync")]
    pub wal_sync: bool,
}

fn default_threshold() -> usize {
    DEFAULT_MEMTABLE_SIZE_THRESHOLD
}

fn default_wal_sync() -> bool {
    true
}

impl Config {
    /// Creates a config for `data_dir` with default threshold and sync policy.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            memtable_size_threshold: DEFAULT_MEMTABLE_SIZE_THRESHOLD,
            wal_sync: true,
        }
    }

    /// The WAL directory: `<data_dir>/wal`.
    #[must_use]
    pub fn wal_dir(&self) -> PathBuf {
        self.data_dir.join("wal")
    }

    /// The on-disk table directory: `<data_dir>/sstables`.
    #[must_use]
    pub fn sstable_dir(&self) -> PathBuf {
        self.data_dir.join("sstables")
    }

    /// Validates the threshold and ensures `data_dir` and its derived
    /// subdirectories exist and are writable, creating them if necessary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memtable_size_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }

        ensure_writable_dir(&self.data_dir)?;
        ensure_writable_dir(&self.wal_dir())?;
        ensure_writable_dir(&self.sstable_dir())?;

        Ok(())
    }
}

fn ensure_writable_dir(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        info!(?path, "creating data directory");
        std::fs::create_dir_all(path).map_err(|source| ConfigError::DirNotWritable {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let probe = path.join(".tectonkv_write_probe");
    std::fs::write(&probe, b"ok").map_err(|source| ConfigError::DirNotWritable {
        path: path.to_path_buf(),
        source,
    })?;
    let _ = std::fs::remove_file(&probe);

    Ok(())
}

#[cfg(test)]
mod tests;
