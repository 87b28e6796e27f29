use govl_types::{EntryDraft, LedgerEntry};

use crate::error::LedgerError;

/// Write boundary: the only way entries enter the chain.
pub trait LedgerWriter: Send + Sync {
    /// Assign the next sequence, chain the draft onto the tail, persist it
    /// durably, and return the stored entry.
    fn append(&self, draft: EntryDraft) -> Result<LedgerEntry, LedgerError>;
}

/// Read boundary for auditors, the gate, and the fairness monitor.
///
/// Readers fix a snapshot by calling [`LedgerReader::length`] first and
/// reading up to that length; entries appended afterwards are simply not in
/// their view.
pub trait LedgerReader: Send + Sync {
    /// Current number of entries.
    fn length(&self) -> u64;

    /// Entries `[from, to]` inclusive, in sequence order.
    ///
    /// Fails with [`LedgerError::Range`] if `from < 1`, `to < from`, or
    /// `to > length()`.
    fn read_range(&self, from: u64, to: u64) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// The entry at `sequence`, if it exists.
    fn entry(&self, sequence: u64) -> Option<LedgerEntry> {
        if sequence == 0 || sequence > self.length() {
            return None;
        }
        self.read_range(sequence, sequence).ok()?.pop()
    }

    /// The last entry in the chain.
    fn tail(&self) -> Option<LedgerEntry> {
        self.entry(self.length())
    }

    /// Every entry up to a snapshot length captured at call time.
    fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        match self.length() {
            0 => Ok(Vec::new()),
            length => self.read_range(1, length),
        }
    }

    /// The most recent entries, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<LedgerEntry>, LedgerError> {
        let length = self.length();
        if length == 0 || limit == 0 {
            return Ok(Vec::new());
        }
        let from = length.saturating_sub(limit as u64) + 1;
        let mut entries = self.read_range(from, length)?;
        entries.reverse();
        Ok(entries)
    }
}
