//! Read path: `get()`.
//!
//! Consults tiers newest to oldest — active memtable, frozen memtable, then
//! on-disk tables from newest to newest — stopping at the first tier that
//! yields any entry for the key. This short-circuit relies on sequences
//! being globally monotonic and tiers being consulted newest-first; it
//! would have to be re-derived if compaction or out-of-order flush were
//! ever introduced.

use tracing::instrument;

use crate::{Engine, EngineError};

impl Engine {
    /// Looks up `key`, returning `Some(value)` if a live entry exists for it
    /// anywhere in the engine, or `None` if the key was never written or its
    /// newest entry is a tombstone.
    #[instrument(skip(self, key), fields(key_len = key.len()))]
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let inner = self.lock()?;

        if let Some(entry) = inner.active.get_entry(key) {
            return Ok(entry.value.clone());
        }

        if let Some(ref frozen) = inner.frozen {
            if let Some(entry) = frozen.get_entry(key) {
                return Ok(entry.value.clone());
            }
        }

        for path in inner.on_disk.iter().rev() {
            let reader = sstable::SstableReader::open(path)?;
            if let Some(entry) = reader.get(key)? {
                return Ok(entry.value);
            }
        }

        Ok(None)
    }
}
