//! # WAL — Write-Ahead Log
//!
//! Provides crash-safe durability for the TectonKV storage engine.
//!
//! Every mutation (`PUT` or `DELETE`) is serialized into a binary record and
//! appended to the WAL **before** the corresponding in-memory update. On
//! restart the WAL is replayed to reconstruct the memtable, guaranteeing that
//! no acknowledged write is lost.
//!
//! ## Binary Record Format
//!
//! ```text
//! seq:u64 | key_len:u32 | value_len:u32 | type:u8 | key_bytes | value_bytes
//! ```
//!
//! All integers are big-endian. `type` is `1` for PUT, `2` for DELETE.
//! DELETE records carry `value_len = 0` and no value bytes. There is no
//! length-prefixed frame and no checksum — the engine treats a fully
//! readable record as trusted, and a record whose fields don't fully read
//! as corruption.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wal::{WalWriter, WalReader, WalRecord};
//!
//! let mut w = WalWriter::create("wal.log", true).unwrap();
//! w.append(&WalRecord::Put {
//!     seq: 1,
//!     key: b"hello".to_vec(),
//!     value: b"world".to_vec(),
//! }).unwrap();
//! drop(w);
//!
//! let mut r = WalReader::open("wal.log").unwrap();
//! r.replay(0, |rec| println!("{:?}", rec)).unwrap();
//! ```

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, trace, warn};

/// Record type tag for a PUT record.
const TYPE_PUT: u8 = 1;
/// Record type tag for a DELETE record.
const TYPE_DELETE: u8 = 2;

/// A single WAL record representing either a key-value insertion or a deletion.
///
/// Each record carries a monotonically increasing **sequence number** that the
/// engine uses for ordering and recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    /// A key-value insertion.
    Put {
        /// Sequence number assigned by the engine.
        seq: u64,
        /// The lookup key.
        key: Vec<u8>,
        /// The payload value.
        value: Vec<u8>,
    },
    /// A key deletion (tombstone).
    Del {
        /// Sequence number assigned by the engine.
        seq: u64,
        /// The key to delete.
        key: Vec<u8>,
    },
}

impl WalRecord {
    /// Returns the sequence number carried by this record.
    #[must_use]
    pub fn seq(&self) -> u64 {
        match self {
            WalRecord::Put { seq, .. } => *seq,
            WalRecord::Del { seq, .. } => *seq,
        }
    }
}

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record was truncated mid-field or carried an unknown type tag.
    #[error("corrupt wal record")]
    Corrupt,
}

/// Append-only WAL writer.
///
/// Records are serialized into a reusable in-memory buffer and written to
/// the underlying file in a single `write_all` call. When `sync` is `true`,
/// every append is followed by `sync_all()` (fsync), so the caller is
/// entitled to assume durability once `append` returns `Ok`.
pub struct WalWriter {
    file: File,
    sync: bool,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens (or creates) a WAL file in append mode.
    ///
    /// * `path` - file system path for the WAL (created if it does not exist).
    /// * `sync` - if true, every `append` call is followed by `fsync`.
    pub fn create<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        Ok(Self {
            file,
            sync,
            buf: Vec::with_capacity(256),
        })
    }

    /// Appends a PUT record for `key`/`value` at `seq`.
    pub fn append_put(&mut self, seq: u64, key: &[u8], value: &[u8]) -> Result<(), WalError> {
        self.append(&WalRecord::Put {
            seq,
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Appends a DELETE (tombstone) record for `key` at `seq`.
    pub fn append_delete(&mut self, seq: u64, key: &[u8]) -> Result<(), WalError> {
        self.append(&WalRecord::Del {
            seq,
            key: key.to_vec(),
        })
    }

    /// Serializes `record` and appends it to the WAL file, flushing to
    /// stable storage before returning (when `sync` is enabled).
    pub fn append(&mut self, record: &WalRecord) -> Result<(), WalError> {
        self.buf.clear();

        match record {
            WalRecord::Put { seq, key, value } => {
                self.buf.write_u64::<BigEndian>(*seq)?;
                self.buf.write_u32::<BigEndian>(key.len() as u32)?;
                self.buf.write_u32::<BigEndian>(value.len() as u32)?;
                self.buf.write_u8(TYPE_PUT)?;
                self.buf.extend_from_slice(key);
                self.buf.extend_from_slice(value);
            }
            WalRecord::Del { seq, key } => {
                self.buf.write_u64::<BigEndian>(*seq)?;
                self.buf.write_u32::<BigEndian>(key.len() as u32)?;
                self.buf.write_u32::<BigEndian>(0)?;
                self.buf.write_u8(TYPE_DELETE)?;
                self.buf.extend_from_slice(key);
            }
        }

        self.file.write_all(&self.buf)?;
        self.file.flush()?;

        if self.sync {
            self.file.sync_all()?;
        }

        trace!(seq = record.seq(), bytes = self.buf.len(), "wal record appended");
        Ok(())
    }

    /// Forces all buffered data to be written to disk via `sync_all()`.
    ///
    /// Useful when `sync` is `false` and the caller wants to force
    /// durability at a specific point.
    pub fn sync_to_disk(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Sequential WAL reader that yields replayed records in file order.
///
/// Generic over any `Read` implementor, allowing use with real files
/// (`WalReader<File>`) or in-memory buffers for testing.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    /// Opens an existing WAL file for sequential replay.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    /// Constructs a reader from any `Read` implementor.
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays records in file order, calling `apply` for each one whose
    /// sequence number is strictly greater than `from_seq`.
    ///
    /// A clean EOF exactly at a record boundary ends replay successfully.
    /// A short read partway through a record (the header started but a
    /// later field hit EOF, or a key/value body was truncated) is reported
    /// as [`WalError::Corrupt`], per the v0.1 strict-tail policy — a crash
    /// mid-append is expected to be rare and the caller is expected to want
    /// to know about it rather than silently lose the partial record.
    pub fn replay<F>(&mut self, from_seq: u64, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(WalRecord),
    {
        loop {
            let seq = match self.rdr.read_u64::<BigEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(WalError::Io(e)),
            };

            let key_len = self.read_field_u32()? as usize;
            let value_len = self.read_field_u32()? as usize;
            let ty = self.read_field_u8()?;

            let mut key = vec![0u8; key_len];
            self.rdr
                .read_exact(&mut key)
                .map_err(|_| WalError::Corrupt)?;

            let record = match ty {
                TYPE_PUT => {
                    let mut value = vec![0u8; value_len];
                    self.rdr
                        .read_exact(&mut value)
                        .map_err(|_| WalError::Corrupt)?;
                    WalRecord::Put { seq, key, value }
                }
                TYPE_DELETE => WalRecord::Del { seq, key },
                _ => {
                    warn!(seq, ty, "unknown wal record type");
                    return Err(WalError::Corrupt);
                }
            };

            if seq > from_seq {
                apply(record);
            } else {
                debug!(seq, from_seq, "skipping already-applied wal record");
            }
        }
    }

    /// Reads a `u32` field, mapping an EOF mid-record to [`WalError::Corrupt`]
    /// (only a clean EOF *before* the `seq` field is a normal end-of-log).
    fn read_field_u32(&mut self) -> Result<u32, WalError> {
        self.rdr.read_u32::<BigEndian>().map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                WalError::Corrupt
            } else {
                WalError::Io(e)
            }
        })
    }

    fn read_field_u8(&mut self) -> Result<u8, WalError> {
        self.rdr.read_u8().map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                WalError::Corrupt
            } else {
                WalError::Io(e)
            }
        })
    }
}
