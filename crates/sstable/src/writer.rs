use byteorder::{BigEndian, WriteBytesExt};
use memtable::ValueEntry;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tracing::debug;

use crate::format::{self, Footer, FLAG_TOMBSTONE};
use crate::SstableError;

/// Writes a sorted sequence of entries to disk as an immutable on-disk table.
///
/// The writer is stateless — all work happens inside
/// [`write`](SstableWriter::write). The write is crash-safe: data is first
/// written to a temporary file, fsynced, and only then atomically renamed
/// to the final path. The caller is responsible for choosing `path` and for
/// handing entries in ascending, unique-key order (the memtable's iteration
/// order already satisfies this).
pub struct SstableWriter {}

impl SstableWriter {
    /// Writes `entries` to a new on-disk table at `path`.
    ///
    /// `entries` must be in ascending key order with unique keys; passing
    /// anything else produces a table whose index will not match its data
    /// block correctly (unspecified behavior, not validated here).
    ///
    /// # Errors
    ///
    /// Returns [`SstableError::EmptyInput`] if `entries` is empty, or an I/O
    /// error if any write, fsync, or rename fails.
    pub fn write<I>(path: &Path, entries: I) -> Result<(), SstableError>
    where
        I: Iterator<Item = (Vec<u8>, ValueEntry)>,
    {
        let tmp_path = path.with_extension("sst.tmp");
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        let mut index: Vec<(Vec<u8>, u64)> = Vec::new();
        let mut max_seq: u64 = 0;

        for (key, entry) in entries {
            max_seq = max_seq.max(entry.seq);

            let offset = file.stream_position()?;
            let flags = if entry.value.is_none() { FLAG_TOMBSTONE } else { 0 };
            let value_len = entry.value.as_ref().map_or(0, Vec::len);

            file.write_u32::<BigEndian>(key.len() as u32)?;
            file.write_u32::<BigEndian>(value_len as u32)?;
            file.write_u64::<BigEndian>(entry.seq)?;
            file.write_u8(flags)?;
            file.write_all(&key)?;
            if let Some(ref v) = entry.value {
                file.write_all(v)?;
            }

            index.push((key, offset));
        }

        if index.is_empty() {
            drop(file);
            let _ = std::fs::remove_file(&tmp_path);
            return Err(SstableError::EmptyInput);
        }

        let index_offset = file.stream_position()?;
        for (key, data_offset) in &index {
            file.write_u32::<BigEndian>(key.len() as u32)?;
            file.write_all(key)?;
            file.write_i64::<BigEndian>(*data_offset as i64)?;
        }

        let footer = Footer {
            index_offset,
            entry_count: index.len() as u64,
            max_seq,
        };
        format::write_footer(&mut file, &footer)?;

        file.flush()?;
        file.into_inner()
            .map_err(|e| SstableError::Io(e.into_error()))?
            .sync_all()?;

        rename(&tmp_path, path)?;

        // Fsync the parent directory so the rename itself is durable; a
        // crash after rename but before this would leave the file present
        // but possibly not visible in the directory entry on some filesystems.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(path = %path.display(), entries = index.len(), max_seq, "on-disk table written");
        Ok(())
    }
}
