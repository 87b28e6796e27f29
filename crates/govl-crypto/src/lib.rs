//! Hash engine for the Governance Ledger.
//!
//! Provides the deterministic canonical encoding of entry fields, the
//! domain-separated BLAKE3 digest that links entries, and the slice-level
//! hash chain walk the ledger's verifier is built on.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod canonical;
pub mod chain;
pub mod hasher;

pub use canonical::encode_fields;
pub use chain::{ChainError, HashChainVerifier};
pub use hasher::EntryHasher;
