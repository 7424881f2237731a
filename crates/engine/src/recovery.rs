//! Cold-start recovery: WAL replay and leftover temp-file cleanup.

use memtable::Memtable;
use std::path::Path;
use tracing::{debug, warn};
use wal::{WalError, WalReader, WalRecord};

use crate::EngineError;

/// Replays `wal_path` into a fresh [`Memtable`], returning it along with the
/// highest sequence number observed.
///
/// Replay is idempotent by construction: an entry is only applied if its
/// sequence number is strictly greater than the running maximum seen so
/// far, so replaying the same log twice in a row (or a log with duplicate
/// tail entries from a retried append) leaves the memtable in the same
/// final state. If the WAL file does not exist yet, returns an empty
/// memtable at sequence 0 (fresh start).
pub fn replay_wal(wal_path: &Path) -> Result<(Memtable, u64), EngineError> {
    let mut reader = match WalReader::open(wal_path) {
        Ok(r) => r,
        Err(WalError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok((Memtable::new(), 0));
        }
        Err(e) => return Err(e.into()),
    };

    let mut mem = Memtable::new();
    let mut running_max = 0u64;

    reader.replay(0, |record| {
        let seq = record.seq();
        if seq <= running_max {
            debug!(seq, running_max, "skipping out-of-order wal record on replay");
            return;
        }
        match record {
            WalRecord::Put { seq, key, value } => mem.put(key, value, seq),
            WalRecord::Del { seq, key } => mem.delete(key, seq),
        }
        running_max = seq;
    })?;

    Ok((mem, running_max))
}

/// Removes any `.sst.tmp` files left behind by a flush that was interrupted
/// mid-write. Their presence never indicates a complete on-disk table —
/// only the atomic rename makes a table visible under its final name.
pub fn cleanup_tmp_sstables(sst_dir: &Path) -> std::io::Result<()> {
    let entries = match std::fs::read_dir(sst_dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tmp")
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.ends_with(".sst"))
                .unwrap_or(false)
        {
            warn!(path = %path.display(), "removing leftover temp file from interrupted flush");
            std::fs::remove_file(&path)?;
        }
    }

    Ok(())
}
