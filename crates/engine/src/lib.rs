//! # Engine - TectonKV storage engine
//!
//! The central orchestrator that ties together the [`memtable`], [`wal`], and
//! [`sstable`] crates into a small embedded LSM-tree key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → WAL append → active memtable insert│
//! │              |                                │
//! │              |  (threshold exceeded?)         │
//! │              |            yes                 │
//! │              v                                │
//! │           flush() → new on-disk table         │
//! │                                               │
//! │ read.rs → active memtable → frozen memtable   │
//! │            → on-disk tables newest-first      │
//! │            (first match wins)                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module        | Purpose                                                |
//! |---------------|---------------------------------------------------------|
//! | [`lib.rs`]    | `Engine` handle, `open`, diagnostics                    |
//! | [`recovery`]  | WAL replay, `.sst.tmp` cleanup                           |
//! | [`write`]     | `put()`, `delete()`, internal `flush()`                 |
//! | [`read`]      | `get()`                                                 |
//!
//! ## Concurrency
//!
//! All public operations are serialized by a single mutex held for the
//! entire span of each call — there is no internal asynchrony, and flush
//! runs synchronously inside `put`/`delete` when the threshold is crossed.
//! See the crate's design notes for why this is an intentional v0.1
//! simplification rather than an oversight.
//!
//! ## Crash safety
//!
//! Every mutation is appended to the WAL **before** the in-memory update.
//! The WAL is never truncated in v0.1 — on-disk tables accumulate
//! independently and the WAL remains the full history. On-disk tables are
//! written to a temp file, fsynced, and atomically renamed into place, so a
//! crash mid-flush leaves at most a stray `.sst.tmp` file and never a
//! partially visible `.sst`.

mod read;
mod recovery;
mod write;

use config::Config;
use memtable::{Memtable, ValueEntry};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, instrument};
use wal::WalWriter;

/// Errors surfaced by the engine.
///
/// Per the v0.1 error model, "not found" is never an error — it is the
/// `found = false` case of a successful [`Engine::get`] call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An underlying I/O error not otherwise classified below.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A WAL append or replay failure.
    #[error(transparent)]
    Wal(#[from] wal::WalError),

    /// An on-disk table write, rename, or read failure.
    #[error(transparent)]
    Sstable(#[from] sstable::SstableError),

    /// Configuration validation failed (e.g. the data directory isn't
    /// writable).
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// The sequence counter reached `u64::MAX`; no room for another mutation.
    #[error("sequence number overflow")]
    SeqOverflow,

    /// The engine's internal mutex was poisoned by a panicking holder.
    #[error("internal engine lock was poisoned by a prior panic")]
    LockPoisoned,
}

/// Mutable runtime state protected by the engine's single lock.
struct EngineInner {
    /// Current mutable write buffer.
    active: Memtable,
    /// Present only during the narrow window inside `flush` where the
    /// just-frozen memtable is being drained and written to disk.
    frozen: Option<Memtable>,
    /// Paths of on-disk tables, oldest to newest. Not re-enumerated from
    /// the on-disk directory at open — see [`Engine::open`].
    on_disk: Vec<PathBuf>,
    wal_writer: WalWriter,
    seq: u64,
}

/// The embedded LSM-tree storage engine.
///
/// Cloning an `Engine` is cheap and shares the same underlying state (the
/// clone and the original both operate through the same lock) — this
/// mirrors how callers embed the engine behind a single shared handle
/// rather than re-opening the data directory from multiple instances,
/// which is explicitly out of scope (see the crate's design notes).
#[derive(Clone)]
pub struct Engine {
    config: Config,
    inner: Arc<Mutex<EngineInner>>,
}

impl Engine {
    /// Opens (or creates) the engine at `config.data_dir`.
    ///
    /// # Recovery steps
    ///
    /// 1. Validate the config and ensure `data_dir`, `wal/`, and
    ///    `sstables/` exist.
    /// 2. Remove any leftover `.sst.tmp` files from an interrupted flush.
    /// 3. Replay the WAL from sequence 0 into a fresh active memtable,
    ///    idempotently (an entry is applied only if its sequence exceeds
    ///    the running maximum observed so far).
    /// 4. Open the WAL writer in append mode.
    /// 5. Set the sequence counter to the maximum observed during replay.
    ///
    /// The list of on-disk tables is intentionally left empty; v0.1 does
    /// not re-enumerate `sstables/` on open (see the crate's design notes
    /// for the resolved open question).
    #[instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
    pub fn open(config: Config) -> Result<Self, EngineError> {
        config.validate()?;

        recovery::cleanup_tmp_sstables(&config.sstable_dir())?;

        let wal_path = config.wal_dir().join("wal.log");
        let (active, seq) = recovery::replay_wal(&wal_path)?;

        let wal_writer = WalWriter::create(&wal_path, config.wal_sync)?;

        info!(seq, entries = active.len(), "engine opened");

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(EngineInner {
                active,
                frozen: None,
                on_disk: Vec::new(),
                wal_writer,
                seq,
            })),
        })
    }

    /// Releases the engine's resources.
    ///
    /// There is nothing to flush: every acknowledged mutation is already
    /// durable in the WAL, and an unflushed memtable is reconstructed on
    /// the next [`open`](Engine::open) by replay. This method exists for
    /// API symmetry with the embeddable library surface.
    pub fn close(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Returns the current sequence counter.
    ///
    /// Test-only diagnostic, per the library's external interface.
    pub fn current_seq(&self) -> Result<u64, EngineError> {
        let inner = self.lock()?;
        Ok(inner.seq)
    }

    /// Returns every entry currently held in the active memtable.
    ///
    /// Test-only diagnostic: lets callers assert directly on in-memory
    /// state without going through a flush.
    pub fn debug_active_entries(&self) -> Result<Vec<(Vec<u8>, ValueEntry)>, EngineError> {
        let inner = self.lock()?;
        Ok(inner
            .active
            .iter()
            .map(|(k, v)| (k.to_vec(), v.clone()))
            .collect())
    }

    /// Returns the number of on-disk tables accumulated so far.
    pub fn sstable_count(&self) -> Result<usize, EngineError> {
        let inner = self.lock()?;
        Ok(inner.on_disk.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, EngineInner>, EngineError> {
        self.inner.lock().map_err(|_| EngineError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests;
