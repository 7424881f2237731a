//! Write path: `put()`, `delete()`, and the internal `flush()`.
//!
//! Every mutation is serialized under the engine's single lock: bump the
//! sequence counter, append to the WAL, apply to the active memtable, and
//! flush synchronously if the threshold is now crossed.

use std::mem;
use tracing::{debug, instrument};
use wal::WalRecord;

use crate::{Engine, EngineError, EngineInner};

impl Engine {
    /// Inserts a key-value pair, assigning it the next sequence number.
    ///
    /// # Errors
    ///
    /// If the WAL append fails, the sequence counter is rolled back so no
    /// gap is observable, and the failure is returned to the caller
    /// unchanged. A flush failure (writer or rename) is fatal in v0.1.
    #[instrument(skip(self, key, value), fields(key_len = key.len(), value_len = value.len()))]
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), EngineError> {
        let mut inner = self.lock()?;

        let seq = next_seq(&mut inner)?;
        if let Err(e) = inner.wal_writer.append(&WalRecord::Put {
            seq,
            key: key.clone(),
            value: value.clone(),
        }) {
            inner.seq -= 1;
            return Err(e.into());
        }

        inner.active.put(key, value, seq);
        maybe_flush(self, &mut inner)
    }

    /// Deletes a key by recording a tombstone at the next sequence number.
    ///
    /// Same durability and rollback semantics as [`put`](Engine::put).
    #[instrument(skip(self, key), fields(key_len = key.len()))]
    pub fn delete(&self, key: Vec<u8>) -> Result<(), EngineError> {
        let mut inner = self.lock()?;

        let seq = next_seq(&mut inner)?;
        if let Err(e) = inner.wal_writer.append(&WalRecord::Del {
            seq,
            key: key.clone(),
        }) {
            inner.seq -= 1;
            return Err(e.into());
        }

        inner.active.delete(key, seq);
        maybe_flush(self, &mut inner)
    }

    /// Flushes the active memtable to a new on-disk table now, regardless of
    /// whether the size threshold has been crossed. A no-op if the active
    /// memtable is empty.
    pub fn force_flush(&self) -> Result<(), EngineError> {
        let mut inner = self.lock()?;
        if inner.active.is_empty() {
            return Ok(());
        }
        flush(self, &mut inner)
    }
}

fn next_seq(inner: &mut EngineInner) -> Result<u64, EngineError> {
    inner.seq = inner.seq.checked_add(1).ok_or(EngineError::SeqOverflow)?;
    Ok(inner.seq)
}

fn maybe_flush(engine: &Engine, inner: &mut EngineInner) -> Result<(), EngineError> {
    if inner.active.approx_size() >= engine.config.memtable_size_threshold {
        flush(engine, inner)?;
    }
    Ok(())
}

/// Freezes the active memtable, writes it to a new on-disk table, and
/// clears the frozen slot. The WAL is never truncated in v0.1 — it remains
/// the full history of every mutation ever applied.
fn flush(engine: &Engine, inner: &mut EngineInner) -> Result<(), EngineError> {
    let frozen = mem::replace(&mut inner.active, memtable::Memtable::new());
    inner.frozen = Some(frozen);
    let seq = inner.seq;

    let entries = inner.frozen.as_mut().expect("just set above").drain_sorted();
    if entries.is_empty() {
        inner.frozen = None;
        return Ok(());
    }

    let path = engine
        .config
        .sstable_dir()
        .join(format!("sst_{:020}.sst", seq));

    let write_result = sstable::SstableWriter::write(&path, entries.into_iter());
    inner.frozen = None;
    write_result?;

    inner.on_disk.push(path.clone());
    debug!(path = %path.display(), seq, "flushed active memtable to on-disk table");
    Ok(())
}
