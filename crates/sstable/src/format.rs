//! On-disk table binary format constants and footer read/write helpers.
//!
//! ## Footer (28 bytes, always the last bytes of the file)
//!
//! ```text
//! [index_offset: u64][entry_count: u64][max_seq: u64][magic: u32]
//! ```
//!
//! All integers are big-endian.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Result as IoResult, Seek, SeekFrom, Write};

/// Magic tag identifying this on-disk table format version (ASCII "TKV1").
pub const MAGIC: u32 = 0x544B_5631;

/// Size of the footer in bytes: 8 + 8 + 8 + 4.
pub const FOOTER_BYTES: u64 = 8 + 8 + 8 + 4;

/// Bit 0 of the data-block `flags` byte marks a tombstone (deleted entry).
pub const FLAG_TOMBSTONE: u8 = 0b0000_0001;

/// A parsed footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Byte offset where the index block begins.
    pub index_offset: u64,
    /// Number of entries in the data/index blocks.
    pub entry_count: u64,
    /// Maximum sequence number among all entries in this table.
    pub max_seq: u64,
}

/// Writes the 28-byte footer to `w`.
pub fn write_footer<W: Write>(w: &mut W, footer: &Footer) -> IoResult<()> {
    w.write_u64::<BigEndian>(footer.index_offset)?;
    w.write_u64::<BigEndian>(footer.entry_count)?;
    w.write_u64::<BigEndian>(footer.max_seq)?;
    w.write_u32::<BigEndian>(MAGIC)?;
    Ok(())
}

/// Reads the footer from the end of `r`, validating the magic tag.
///
/// Leaves the cursor position unspecified; callers seek explicitly before
/// their next read.
pub fn read_footer<R: Read + Seek>(r: &mut R) -> IoResult<Footer> {
    let filesize = r.seek(SeekFrom::End(0))?;
    if filesize < FOOTER_BYTES {
        return Err(io_err("file too small for on-disk table footer"));
    }

    r.seek(SeekFrom::Start(filesize - FOOTER_BYTES))?;
    let index_offset = r.read_u64::<BigEndian>()?;
    let entry_count = r.read_u64::<BigEndian>()?;
    let max_seq = r.read_u64::<BigEndian>()?;
    let magic = r.read_u32::<BigEndian>()?;

    if magic != MAGIC {
        return Err(io_err(format!(
            "bad magic tag: expected {:#010x}, got {:#010x}",
            MAGIC, magic
        )));
    }

    Ok(Footer {
        index_offset,
        entry_count,
        max_seq,
    })
}

fn io_err(msg: impl Into<String>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg.into())
}
