use byteorder::{BigEndian, ReadBytesExt};
use memtable::ValueEntry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::trace;

use crate::format::{self, Footer, FLAG_TOMBSTONE};
use crate::SstableError;

/// Maximum key size we'll allocate while reading index/data records (64 KiB).
/// Guards against unbounded allocation on a corrupt or truncated file.
const MAX_KEY_BYTES: usize = 64 * 1024;
/// Maximum value size we'll allocate while reading a data record (10 MiB).
const MAX_VALUE_BYTES: usize = 10 * 1024 * 1024;

/// Reads an on-disk table for point lookups.
///
/// On [`open`](SstableReader::open) the entire index is loaded into memory
/// as a `BTreeMap<Vec<u8>, u64>` (key to data-block byte offset). A
/// persistent file handle is kept open for the reader's lifetime, wrapped
/// in a `Mutex` so [`get`](SstableReader::get) can be called through a
/// shared `&self` reference.
pub struct SstableReader {
    path: PathBuf,
    index: BTreeMap<Vec<u8>, u64>,
    file: Mutex<BufReader<File>>,
    footer: Footer,
}

impl SstableReader {
    /// Opens an on-disk table and loads its index into memory.
    ///
    /// # Errors
    ///
    /// Returns [`SstableError::Corrupt`] if the file is too small, the
    /// footer magic doesn't match, or an index record is truncated or
    /// points outside the file; [`SstableError::Io`] on any I/O failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SstableError> {
        let path_buf = path.as_ref().to_path_buf();
        let mut f = File::open(&path_buf)?;
        let filesize = f.metadata()?.len();

        let footer = format::read_footer(&mut f).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                SstableError::Corrupt(e.to_string())
            } else {
                SstableError::Io(e)
            }
        })?;

        if footer.index_offset >= filesize {
            return Err(SstableError::Corrupt(format!(
                "index_offset {} outside file of size {}",
                footer.index_offset, filesize
            )));
        }

        f.seek(SeekFrom::Start(footer.index_offset))?;
        let mut index = BTreeMap::new();
        let index_end = filesize - format::FOOTER_BYTES;

        while f.stream_position()? < index_end {
            let key_len = f.read_u32::<BigEndian>()? as usize;
            if key_len > MAX_KEY_BYTES {
                return Err(SstableError::Corrupt(format!(
                    "index key_len {} exceeds maximum {}",
                    key_len, MAX_KEY_BYTES
                )));
            }
            let mut key = vec![0u8; key_len];
            f.read_exact(&mut key)
                .map_err(|_| SstableError::Corrupt("truncated index key".into()))?;
            let data_offset = f
                .read_i64::<BigEndian>()
                .map_err(|_| SstableError::Corrupt("truncated index data_offset".into()))?;
            index.insert(key, data_offset as u64);
        }

        if index.len() as u64 != footer.entry_count {
            return Err(SstableError::Corrupt(format!(
                "index has {} entries, footer claims {}",
                index.len(),
                footer.entry_count
            )));
        }

        Ok(Self {
            path: path_buf,
            index,
            file: Mutex::new(BufReader::new(f)),
            footer,
        })
    }

    /// Point lookup for a single key.
    ///
    /// Returns `Ok(Some(entry))` if the key exists in this table (the entry
    /// may be a tombstone with `value: None`). Returns `Ok(None)` if the key
    /// is absent from the index.
    pub fn get(&self, key: &[u8]) -> Result<Option<ValueEntry>, SstableError> {
        let offset = match self.index.get(key) {
            Some(&o) => o,
            None => return Ok(None),
        };

        let mut f = self
            .file
            .lock()
            .map_err(|_| SstableError::Corrupt("reader file lock poisoned".into()))?;
        f.seek(SeekFrom::Start(offset))?;

        let key_len = f.read_u32::<BigEndian>()? as usize;
        let value_len = f.read_u32::<BigEndian>()? as usize;
        if key_len > MAX_KEY_BYTES {
            return Err(SstableError::Corrupt(format!(
                "data key_len {} exceeds maximum {}",
                key_len, MAX_KEY_BYTES
            )));
        }
        if value_len > MAX_VALUE_BYTES {
            return Err(SstableError::Corrupt(format!(
                "data value_len {} exceeds maximum {}",
                value_len, MAX_VALUE_BYTES
            )));
        }
        let seq = f.read_u64::<BigEndian>()?;
        let flags = f.read_u8()?;

        let mut key_buf = vec![0u8; key_len];
        f.read_exact(&mut key_buf)
            .map_err(|_| SstableError::Corrupt("truncated data key".into()))?;
        if key_buf != key {
            return Err(SstableError::Corrupt(
                "index pointed to mismatching key at offset".into(),
            ));
        }

        let value = if flags & FLAG_TOMBSTONE != 0 {
            None
        } else {
            let mut v = vec![0u8; value_len];
            f.read_exact(&mut v)
                .map_err(|_| SstableError::Corrupt("truncated data value".into()))?;
            Some(v)
        };

        trace!(path = %self.path.display(), seq, "on-disk table point lookup hit");
        Ok(Some(ValueEntry { seq, value }))
    }

    /// Maximum sequence number stored in this table's footer.
    ///
    /// Not consulted on the v0.1 read path; kept for diagnostics and future
    /// range-prune use.
    #[must_use]
    pub fn max_seq(&self) -> u64 {
        self.footer.max_seq
    }

    /// Number of entries in the in-memory index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the table contains zero entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns an iterator over all keys in the in-memory index, in
    /// ascending sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.index.keys().map(|k| k.as_slice())
    }
}
