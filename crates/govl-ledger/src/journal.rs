use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use govl_types::LedgerEntry;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerError;

/// Durable backing for the ledger's chain.
///
/// The ledger calls [`Journal::persist`] under its writer lock, once per
/// append, before the entry becomes visible to readers.
pub trait Journal: Send {
    /// Load every persisted entry in append order.
    fn load(&mut self) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Durably persist one entry.
    ///
    /// On error no part of the entry may survive: a later `load` must not
    /// return it and later appends must not land after a partial write.
    fn persist(&mut self, entry: &LedgerEntry) -> Result<(), LedgerError>;
}

impl<J: Journal + ?Sized> Journal for Box<J> {
    fn load(&mut self) -> Result<Vec<LedgerEntry>, LedgerError> {
        (**self).load()
    }

    fn persist(&mut self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        (**self).persist(entry)
    }
}

/// Journal for ledgers that live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryJournal;

impl Journal for MemoryJournal {
    fn load(&mut self) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(Vec::new())
    }

    fn persist(&mut self, _entry: &LedgerEntry) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Flush/sync strategy for the file journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every append. An acknowledged append survives power loss.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

/// Configuration for the file journal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub sync: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Append-only ledger file.
///
/// Each entry is one frame, stored in sequence order:
/// ```text
/// [4 bytes: row length (little-endian u32)]
/// [4 bytes: CRC32 of row (little-endian u32)]
/// [N bytes: row (JSON-serialized LedgerEntry)]
/// ```
///
/// On load the file is read front-to-back. A torn trailing frame left by a
/// crash is truncated away. A complete frame whose CRC no longer matches is
/// still loaded when its row parses, so that out-of-band edits reach the
/// chain verifier instead of disappearing. A complete frame that cannot be
/// parsed is never truncated.
///
/// If a failed append cannot be rolled back, the journal refuses further
/// appends until it is reopened, since they would land after the partial
/// frame.
pub struct FileJournal {
    path: PathBuf,
    file: File,
    /// Length of the file up to the last fully persisted frame.
    offset: u64,
    config: JournalConfig,
    poisoned: bool,
}

impl FileJournal {
    /// Open (or create) a ledger file at the given path.
    pub fn open(path: &Path, config: JournalConfig) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();

        info!(path = %path.display(), bytes = offset, "ledger journal opened");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            offset,
            config,
            poisoned: false,
        })
    }

    /// Path to the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current end of the persisted frames.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether a partial frame may remain past [`FileJournal::offset`].
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()?;
        if matches!(self.config.sync, SyncMode::EveryWrite) {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut the file back to the last fully persisted frame.
    fn rollback(&mut self) -> io::Result<()> {
        self.file.set_len(self.offset)?;
        self.file.sync_all()
    }
}

impl Journal for FileJournal {
    fn load(&mut self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let file_len = reader.get_ref().metadata()?.len();
        let mut entries = Vec::new();
        let mut offset: u64 = 0;

        while offset < file_len {
            if offset + HEADER_SIZE as u64 > file_len {
                warn!(offset, file_len, "torn frame header; truncating ledger tail");
                break;
            }
            reader.seek(SeekFrom::Start(offset))?;

            let mut header = [0u8; HEADER_SIZE];
            reader.read_exact(&mut header)?;
            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 {
                return Err(LedgerError::CorruptJournal {
                    offset,
                    reason: "zero-length frame".into(),
                });
            }
            let frame_end = offset + HEADER_SIZE as u64 + length as u64;
            if frame_end > file_len {
                warn!(offset, length, file_len, "torn frame; truncating ledger tail");
                break;
            }

            let mut row = vec![0u8; length as usize];
            reader.read_exact(&mut row)?;

            let actual_crc = crc32fast::hash(&row);
            let parsed = serde_json::from_slice::<LedgerEntry>(&row);
            match parsed {
                Ok(entry) => {
                    if actual_crc != expected_crc {
                        warn!(
                            offset,
                            sequence = entry.sequence,
                            expected = expected_crc,
                            actual = actual_crc,
                            "CRC mismatch on a readable row; loading it for verification"
                        );
                    }
                    entries.push(entry);
                }
                Err(e) => {
                    return Err(LedgerError::CorruptJournal {
                        offset,
                        reason: e.to_string(),
                    });
                }
            }

            offset = frame_end;
        }

        if offset < file_len {
            self.file.set_len(offset)?;
            self.file.sync_all()?;
        }
        self.offset = offset;
        self.poisoned = false;

        debug!(recovered = entries.len(), "ledger journal loaded");
        Ok(entries)
    }

    fn persist(&mut self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        if self.poisoned {
            return Err(LedgerError::Storage(format!(
                "journal {} has an unrolled partial frame; reopen it before appending",
                self.path.display()
            )));
        }

        let row = serde_json::to_vec(entry).map_err(|e| LedgerError::Storage(e.to_string()))?;
        let length = u32::try_from(row.len())
            .map_err(|_| LedgerError::Storage(format!("row of {} bytes is too large", row.len())))?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + row.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&row).to_le_bytes());
        frame.extend_from_slice(&row);

        if let Err(e) = self.write_frame(&frame) {
            if let Err(rollback) = self.rollback() {
                warn!(error = %rollback, offset = self.offset, "failed to roll back partial frame");
                self.poisoned = true;
            }
            return Err(LedgerError::Storage(format!(
                "append of seq {} failed: {e}",
                entry.sequence
            )));
        }

        self.offset += frame.len() as u64;
        debug!(sequence = entry.sequence, offset = self.offset, "frame persisted");
        Ok(())
    }
}

impl std::fmt::Debug for FileJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileJournal")
            .field("path", &self.path)
            .field("offset", &self.offset)
            .field("sync", &self.config.sync)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govl_types::{EntryHash, EntryKind, EntryPayload, EntryTimestamp};

    fn make_entry(seq: u64) -> LedgerEntry {
        LedgerEntry {
            sequence: seq,
            timestamp: EntryTimestamp::new(1_000 + seq, 0),
            kind: EntryKind::GatePaused,
            payload: EntryPayload::Gate {
                reason: format!("reason-{seq}"),
            },
            previous_hash: EntryHash::from_hash([seq as u8; 32]),
            entry_hash: EntryHash::from_hash([seq as u8 + 1; 32]),
        }
    }

    fn open(path: &Path) -> FileJournal {
        FileJournal::open(path, JournalConfig::default()).unwrap()
    }

    #[test]
    fn persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.govl");

        let mut journal = open(&path);
        for seq in 1..=3 {
            journal.persist(&make_entry(seq)).unwrap();
        }
        drop(journal);

        let mut journal = open(&path);
        let loaded = journal.load().unwrap();
        assert_eq!(loaded, vec![make_entry(1), make_entry(2), make_entry(3)]);
        assert_eq!(journal.offset(), fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut journal = open(&dir.path().join("nested/empty.govl"));
        assert!(journal.load().unwrap().is_empty());
    }

    #[test]
    fn torn_tail_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torn.govl");

        let mut journal = open(&path);
        journal.persist(&make_entry(1)).unwrap();
        let good_len = journal.offset();
        drop(journal);

        // Half a header, as left by a crash mid-append.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0x10, 0x00, 0x00]).unwrap();
        }

        let mut journal = open(&path);
        let loaded = journal.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(fs::metadata(&path).unwrap().len(), good_len);

        // Appends continue cleanly after the truncation.
        journal.persist(&make_entry(2)).unwrap();
        drop(journal);
        assert_eq!(open(&path).load().unwrap().len(), 2);
    }

    #[test]
    fn truncated_payload_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.govl");

        let mut journal = open(&path);
        journal.persist(&make_entry(1)).unwrap();
        journal.persist(&make_entry(2)).unwrap();
        drop(journal);

        let len = fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(len - 5)
            .unwrap();

        let loaded = open(&path).load().unwrap();
        assert_eq!(loaded, vec![make_entry(1)]);
    }

    #[test]
    fn edited_row_is_still_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edited.govl");

        let mut journal = open(&path);
        journal.persist(&make_entry(1)).unwrap();
        journal.persist(&make_entry(2)).unwrap();
        drop(journal);

        // Same-length edit inside the first row's reason text.
        let mut bytes = fs::read(&path).unwrap();
        let needle = b"reason-1";
        let at = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();
        bytes[at + needle.len() - 1] = b'9';
        fs::write(&path, &bytes).unwrap();

        let loaded = open(&path).load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded[0].payload,
            EntryPayload::Gate {
                reason: "reason-9".into()
            }
        );
    }

    #[test]
    fn garbage_in_the_middle_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.govl");

        let mut journal = open(&path);
        journal.persist(&make_entry(1)).unwrap();
        journal.persist(&make_entry(2)).unwrap();
        drop(journal);

        let mut bytes = fs::read(&path).unwrap();
        bytes[HEADER_SIZE] = b'#';
        fs::write(&path, &bytes).unwrap();

        let err = open(&path).load().unwrap_err();
        assert!(matches!(err, LedgerError::CorruptJournal { offset: 0, .. }));
    }

    #[test]
    fn unreadable_complete_final_frame_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final.govl");

        let mut journal = open(&path);
        journal.persist(&make_entry(1)).unwrap();
        let first_len = journal.offset();
        journal.persist(&make_entry(2)).unwrap();
        drop(journal);

        let mut bytes = fs::read(&path).unwrap();
        bytes[first_len as usize + HEADER_SIZE] = b'#';
        fs::write(&path, &bytes).unwrap();

        let err = open(&path).load().unwrap_err();
        assert!(matches!(err, LedgerError::CorruptJournal { offset, .. } if offset == first_len));
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_rollback_refuses_further_appends() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }

        // Writes fail with ENOSPC and a character device cannot be truncated.
        let Ok(mut journal) = FileJournal::open(full, JournalConfig::default()) else {
            return;
        };
        let err = journal.persist(&make_entry(1)).unwrap_err();
        assert!(err.is_storage());
        assert!(journal.is_poisoned());

        let err = journal.persist(&make_entry(2)).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(ref msg) if msg.contains("reopen")));
        assert_eq!(journal.offset(), 0);
    }
}
