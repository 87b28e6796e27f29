use govl_types::EncodingError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The durable write or read could not complete. The chain is unchanged.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt journal at offset {offset}: {reason}")]
    CorruptJournal { offset: u64, reason: String },

    /// The caller asked for entries outside `[1, length]`.
    #[error("invalid sequence range [{from}, {to}] for ledger of length {length}")]
    Range { from: u64, to: u64, length: u64 },

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl LedgerError {
    /// Returns `true` for durable-storage failures, which the caller may
    /// retry as a whole.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Io(_) | Self::CorruptJournal { .. }
        )
    }
}
