use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

use govl_crypto::EntryHasher;
use govl_types::{EntryDraft, EntryFields, EntryHash, EntryTimestamp, LedgerEntry};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::journal::{FileJournal, Journal, JournalConfig, MemoryJournal};
use crate::traits::{LedgerReader, LedgerWriter};

/// The single authoritative chain.
///
/// Appends serialize on one writer mutex that covers sequence assignment,
/// tail-hash capture, digest computation, and the durable write. Only after
/// the journal accepts an entry is it published to readers, under a
/// short-lived write lock on the published list. Readers never wait on
/// journal I/O and never see a partial entry.
pub struct Ledger<J: Journal = MemoryJournal> {
    writer: Mutex<WriterState<J>>,
    published: RwLock<Vec<Arc<LedgerEntry>>>,
}

struct WriterState<J> {
    journal: J,
    next_sequence: u64,
    tail_hash: EntryHash,
    last_timestamp: Option<EntryTimestamp>,
}

impl Ledger<MemoryJournal> {
    /// An empty ledger that lives as long as the process.
    pub fn in_memory() -> Self {
        Self {
            writer: Mutex::new(WriterState {
                journal: MemoryJournal,
                next_sequence: 1,
                tail_hash: EntryHash::GENESIS,
                last_timestamp: None,
            }),
            published: RwLock::new(Vec::new()),
        }
    }
}

impl Default for Ledger<MemoryJournal> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Ledger<FileJournal> {
    /// Open (or create) a ledger file and load its chain.
    pub fn open(path: &Path, config: JournalConfig) -> Result<Self, LedgerError> {
        Self::with_journal(FileJournal::open(path, config)?)
    }
}

impl<J: Journal> Ledger<J> {
    /// Build a ledger over a journal, loading whatever it already holds.
    ///
    /// Loaded entries are not verified here; the chain verifier reports any
    /// tampering. New entries chain onto the stored tail hash.
    pub fn with_journal(mut journal: J) -> Result<Self, LedgerError> {
        let entries = journal.load()?;
        let next_sequence = entries.len() as u64 + 1;
        let tail_hash = entries
            .last()
            .map(|e| e.entry_hash)
            .unwrap_or(EntryHash::GENESIS);
        let last_timestamp = entries.iter().map(|e| e.timestamp).max();

        info!(entries = entries.len(), tail = %tail_hash.short_hex(), "ledger loaded");

        Ok(Self {
            writer: Mutex::new(WriterState {
                journal,
                next_sequence,
                tail_hash,
                last_timestamp,
            }),
            published: RwLock::new(entries.into_iter().map(Arc::new).collect()),
        })
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, WriterState<J>>, LedgerError> {
        self.writer
            .lock()
            .map_err(|_| LedgerError::Storage("ledger writer lock poisoned".into()))
    }

    // Entries are only ever pushed whole, so a poisoned list is still consistent.
    fn published(&self) -> RwLockReadGuard<'_, Vec<Arc<LedgerEntry>>> {
        self.published.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn tamper_with(&self, sequence: u64, edit: impl FnOnce(&mut LedgerEntry)) {
        let mut published = self.published.write().unwrap();
        let slot = &mut published[(sequence - 1) as usize];
        let mut entry = (**slot).clone();
        edit(&mut entry);
        *slot = Arc::new(entry);
    }
}

impl<J: Journal> LedgerWriter for Ledger<J> {
    fn append(&self, draft: EntryDraft) -> Result<LedgerEntry, LedgerError> {
        draft.validate()?;

        let mut writer = self.lock_writer()?;

        let sequence = writer.next_sequence;
        let previous_hash = writer.tail_hash;
        let timestamp =
            EntryTimestamp::next_after(writer.last_timestamp.as_ref(), EntryTimestamp::now());

        let entry_hash = EntryHasher::ENTRY.digest(
            &previous_hash,
            &EntryFields {
                sequence,
                timestamp,
                kind: draft.kind,
                payload: &draft.payload,
            },
        )?;

        let entry = LedgerEntry {
            sequence,
            timestamp,
            kind: draft.kind,
            payload: draft.payload,
            previous_hash,
            entry_hash,
        };

        writer.journal.persist(&entry)?;

        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(entry.clone()));

        writer.next_sequence += 1;
        writer.tail_hash = entry_hash;
        writer.last_timestamp = Some(timestamp);

        debug!(
            sequence,
            kind = %entry.kind,
            hash = %entry_hash.short_hex(),
            "entry appended"
        );
        Ok(entry)
    }
}

impl<J: Journal> LedgerReader for Ledger<J> {
    fn length(&self) -> u64 {
        self.published().len() as u64
    }

    fn read_range(&self, from: u64, to: u64) -> Result<Vec<LedgerEntry>, LedgerError> {
        let slice: Vec<Arc<LedgerEntry>> = {
            let published = self.published();
            let length = published.len() as u64;
            if from == 0 || to < from || to > length {
                return Err(LedgerError::Range { from, to, length });
            }
            published[(from - 1) as usize..to as usize].to_vec()
        };

        Ok(slice.iter().map(|entry| (**entry).clone()).collect())
    }

    fn entry(&self, sequence: u64) -> Option<LedgerEntry> {
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.published().get(index).map(|entry| (**entry).clone())
    }
}

impl<J: Journal> std::fmt::Debug for Ledger<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("length", &self.length())
            .finish()
    }
}
