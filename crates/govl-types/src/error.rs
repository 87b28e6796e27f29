use thiserror::Error;

use crate::entry::EntryKind;

/// Malformed entry fields, rejected before any hash is computed or any write
/// is attempted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EncodingError {
    #[error("probability must be a finite value in [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),

    #[error("model version must not be empty")]
    EmptyModelVersion,

    #[error("input field names must not be empty")]
    EmptyFieldName,

    #[error("entry kind {kind} does not match a {payload} payload")]
    KindMismatch {
        kind: EntryKind,
        payload: &'static str,
    },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
