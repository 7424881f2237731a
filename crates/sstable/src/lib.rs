//! # Sorted on-disk table
//!
//! Immutable, on-disk storage files for the TectonKV storage engine.
//!
//! When the in-memory [`memtable::Memtable`] exceeds its size threshold the
//! engine flushes it to disk as an on-disk table. Tables are *write-once,
//! read-many* — once created they are never modified.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA BLOCK (sorted entries, ascending by key)                  │
//! │                                                                │
//! │ key_len (u32) | value_len (u32) | seq (u64) | flags (u8)       │
//! │ key_bytes | value_bytes                                        │
//! │                                                                │
//! │ ... repeated for each entry ...                                │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX BLOCK (key -> data_offset mapping)                       │
//! │                                                                │
//! │ key_len (u32) | key_bytes | data_offset (i64)                  │
//! │                                                                │
//! │ ... repeated for each entry ...                                │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 28 bytes)                                  │
//! │                                                                │
//! │ index_offset (u64) | entry_count (u64) | max_seq (u64)         │
//! │ magic (u32)                                                     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. `flags` bit 0 marks a tombstone; tombstone
//! entries carry `value_len = 0` and no value bytes. There is no bloom
//! filter and no checksum — a table that reads back with a valid magic tag
//! is trusted.

mod format;
mod reader;
mod writer;

pub use format::{Footer, FOOTER_BYTES, MAGIC};
pub use reader::SstableReader;
pub use writer::SstableWriter;

use std::io;
use thiserror::Error;

/// Errors that can occur while writing or reading an on-disk table.
#[derive(Debug, Error)]
pub enum SstableError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The footer's magic tag did not match, or an index/data record was
    /// truncated or pointed outside the file.
    #[error("corrupt on-disk table: {0}")]
    Corrupt(String),

    /// The writer was asked to persist zero entries.
    #[error("refusing to write an empty on-disk table")]
    EmptyInput,
}

#[cfg(test)]
mod tests;
