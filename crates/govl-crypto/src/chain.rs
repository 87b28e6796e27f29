use govl_types::{EntryHash, LedgerEntry};

use crate::hasher::EntryHasher;

/// Hash chain integrity verifier.
///
/// Verifies that a contiguous run of entries forms a valid hash chain:
/// sequence numbers follow their positions, each entry's `previous_hash`
/// matches the stored `entry_hash` before it, and each `entry_hash` is
/// correctly computed from the entry's fields.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a run of entries.
    ///
    /// `anchor` is the stored `entry_hash` of the entry just before the run
    /// (or [`EntryHash::GENESIS`] when the run starts the chain) and
    /// `first_sequence` is the sequence the first entry must carry.
    ///
    /// Checks, per entry, stopping at the first failure:
    /// 1. Sequence equals its position
    /// 2. `previous_hash` links to the predecessor
    /// 3. `entry_hash` is reproducible from the stored fields
    pub fn verify_chain(
        entries: &[LedgerEntry],
        anchor: EntryHash,
        first_sequence: u64,
    ) -> Result<(), ChainError> {
        let mut expected_prev = anchor;

        for (offset, entry) in entries.iter().enumerate() {
            let expected_seq = first_sequence + offset as u64;
            if entry.sequence != expected_seq {
                return Err(ChainError::SequenceMismatch {
                    expected: expected_seq,
                    found: entry.sequence,
                });
            }

            if entry.previous_hash != expected_prev {
                return Err(ChainError::BrokenLink {
                    sequence: expected_seq,
                });
            }

            match EntryHasher::ENTRY.digest(&entry.previous_hash, &entry.fields()) {
                Ok(computed) if computed == entry.entry_hash => {}
                Ok(_) => {
                    return Err(ChainError::HashMismatch {
                        sequence: expected_seq,
                    })
                }
                Err(e) => {
                    return Err(ChainError::Unencodable {
                        sequence: expected_seq,
                        reason: e.to_string(),
                    })
                }
            }

            expected_prev = entry.entry_hash;
        }

        Ok(())
    }
}

/// Errors from chain verification. Each names the first bad position.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("sequence mismatch: expected {expected}, found {found}")]
    SequenceMismatch { expected: u64, found: u64 },

    #[error("broken link at seq {sequence}: previous_hash does not match predecessor")]
    BrokenLink { sequence: u64 },

    #[error("hash mismatch at seq {sequence}: computed hash differs from stored")]
    HashMismatch { sequence: u64 },

    #[error("entry at seq {sequence} can no longer be encoded: {reason}")]
    Unencodable { sequence: u64, reason: String },
}

impl ChainError {
    /// The chain position at which verification failed.
    pub fn sequence(&self) -> u64 {
        match self {
            Self::SequenceMismatch { expected, .. } => *expected,
            Self::BrokenLink { sequence }
            | Self::HashMismatch { sequence }
            | Self::Unencodable { sequence, .. } => *sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govl_types::{EntryFields, EntryKind, EntryPayload, EntryTimestamp};

    fn build_chain(count: u64) -> Vec<LedgerEntry> {
        let mut chain = Vec::new();
        let mut prev = EntryHash::GENESIS;

        for seq in 1..=count {
            let payload = EntryPayload::Gate {
                reason: format!("transition-{seq}"),
            };
            let kind = if seq % 2 == 1 {
                EntryKind::GatePaused
            } else {
                EntryKind::GateResumed
            };
            let timestamp = EntryTimestamp::new(1_000 + seq, 0);
            let entry_hash = EntryHasher::ENTRY
                .digest(
                    &prev,
                    &EntryFields {
                        sequence: seq,
                        timestamp,
                        kind,
                        payload: &payload,
                    },
                )
                .unwrap();
            chain.push(LedgerEntry {
                sequence: seq,
                timestamp,
                kind,
                payload,
                previous_hash: prev,
                entry_hash,
            });
            prev = entry_hash;
        }

        chain
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(HashChainVerifier::verify_chain(&[], EntryHash::GENESIS, 1).is_ok());
    }

    #[test]
    fn multi_entry_chain() {
        let chain = build_chain(10);
        assert!(HashChainVerifier::verify_chain(&chain, EntryHash::GENESIS, 1).is_ok());
    }

    #[test]
    fn sub_range_verifies_against_its_anchor() {
        let chain = build_chain(6);
        let anchor = chain[2].entry_hash;
        assert!(HashChainVerifier::verify_chain(&chain[3..], anchor, 4).is_ok());

        let err = HashChainVerifier::verify_chain(&chain[3..], EntryHash::GENESIS, 4).unwrap_err();
        assert_eq!(err, ChainError::BrokenLink { sequence: 4 });
    }

    #[test]
    fn broken_link_detected() {
        let mut chain = build_chain(3);
        chain[2].previous_hash = EntryHash::from_hash([99; 32]);
        let err = HashChainVerifier::verify_chain(&chain, EntryHash::GENESIS, 1).unwrap_err();
        assert_eq!(err, ChainError::BrokenLink { sequence: 3 });
    }

    #[test]
    fn tampered_payload_detected() {
        let mut chain = build_chain(3);
        chain[1].payload = EntryPayload::Gate {
            reason: "tampered".into(),
        };
        let err = HashChainVerifier::verify_chain(&chain, EntryHash::GENESIS, 1).unwrap_err();
        assert_eq!(err, ChainError::HashMismatch { sequence: 2 });
    }

    #[test]
    fn tampered_stored_hash_is_reported_at_its_own_entry() {
        let mut chain = build_chain(3);
        chain[1].entry_hash = EntryHash::from_hash([5; 32]);
        let err = HashChainVerifier::verify_chain(&chain, EntryHash::GENESIS, 1).unwrap_err();
        assert_eq!(err.sequence(), 2);
    }

    #[test]
    fn sequence_edit_detected() {
        let mut chain = build_chain(3);
        chain[1].sequence = 7;
        let err = HashChainVerifier::verify_chain(&chain, EntryHash::GENESIS, 1).unwrap_err();
        assert_eq!(
            err,
            ChainError::SequenceMismatch {
                expected: 2,
                found: 7
            }
        );
        assert_eq!(err.sequence(), 2);
    }

    #[test]
    fn kind_edit_is_unencodable() {
        let mut chain = build_chain(2);
        chain[0].kind = EntryKind::Decision;
        let err = HashChainVerifier::verify_chain(&chain, EntryHash::GENESIS, 1).unwrap_err();
        assert!(matches!(err, ChainError::Unencodable { sequence: 1, .. }));
    }
}
