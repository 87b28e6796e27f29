use govl_crypto::{ChainError, HashChainVerifier};
use govl_types::EntryHash;
use serde::Serialize;
use tracing::warn;

use crate::error::LedgerError;
use crate::traits::LedgerReader;

/// Outcome of verifying a range of the chain.
///
/// A broken chain is a reported result, not an error: it calls for an
/// auditor, and nothing here attempts a repair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub ok: bool,
    /// The first entry whose digest or link does not hold.
    pub first_bad_sequence: Option<u64>,
    pub reason: Option<String>,
    /// Entries verified before stopping.
    pub checked: u64,
}

impl VerificationResult {
    fn valid(checked: u64) -> Self {
        Self {
            ok: true,
            first_bad_sequence: None,
            reason: None,
            checked,
        }
    }

    fn tampered(error: &ChainError, from: u64) -> Self {
        Self {
            ok: false,
            first_bad_sequence: Some(error.sequence()),
            reason: Some(error.to_string()),
            checked: error.sequence() - from,
        }
    }
}

/// Read-only chain verifier over any ledger reader.
pub struct ChainVerifier;

impl ChainVerifier {
    /// Verify entries `[from, to]`.
    ///
    /// For `from > 1` the first entry's link is checked against the stored
    /// `entry_hash` of entry `from - 1`; for `from = 1` against the genesis
    /// constant. The empty range `[from, from - 1]` is vacuously valid as long
    /// as it lies within the ledger.
    pub fn verify<R: LedgerReader + ?Sized>(
        reader: &R,
        from: u64,
        to: u64,
    ) -> Result<VerificationResult, LedgerError> {
        if from >= 1 && to == from - 1 {
            let length = reader.length();
            if to > length {
                return Err(LedgerError::Range { from, to, length });
            }
            return Ok(VerificationResult::valid(0));
        }

        let entries = reader.read_range(from, to)?;
        let anchor = if from == 1 {
            EntryHash::GENESIS
        } else {
            reader
                .read_range(from - 1, from - 1)?
                .pop()
                .map(|predecessor| predecessor.entry_hash)
                .ok_or(LedgerError::Range {
                    from: from - 1,
                    to: from - 1,
                    length: reader.length(),
                })?
        };

        match HashChainVerifier::verify_chain(&entries, anchor, from) {
            Ok(()) => Ok(VerificationResult::valid(entries.len() as u64)),
            Err(error) => {
                warn!(
                    first_bad_sequence = error.sequence(),
                    %error,
                    "ledger chain verification failed"
                );
                Ok(VerificationResult::tampered(&error, from))
            }
        }
    }

    /// Verify the whole chain as of the length at call time.
    pub fn verify_all<R: LedgerReader + ?Sized>(
        reader: &R,
    ) -> Result<VerificationResult, LedgerError> {
        Self::verify(reader, 1, reader.length())
    }
}
