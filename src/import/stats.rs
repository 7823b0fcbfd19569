//! Import statistics tracking.

use serde::Serialize;

/// Counters for a single import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Data rows decoded from the stream
    pub rows_read: usize,
    /// Rows the store actually inserted
    pub inserted: usize,
    /// Rows skipped because their identity triple already existed
    pub duplicates: usize,
    /// Number of batch flushes issued
    pub batches: usize,
}

impl ImportStats {
    /// Rows accepted by the run. Duplicates are not counted.
    pub fn accepted(&self) -> usize {
        self.inserted
    }

    /// Record the outcome of one flushed batch.
    pub fn record_batch(&mut self, batch_len: usize, inserted: u64) {
        let inserted = inserted as usize;
        self.inserted += inserted;
        self.duplicates += batch_len.saturating_sub(inserted);
        self.batches += 1;
    }
}
