//! Append-only decision ledger for the Governance Ledger (GOVL).
//!
//! This crate is the heart of GOVL. It provides:
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - [`Ledger`], the single owner of the authoritative chain, with a
//!   serialized append path and non-blocking, length-bounded reads
//! - Journals that make appends durable: [`MemoryJournal`] for tests and
//!   embedding, [`FileJournal`] for an append-only file on disk
//! - [`ChainVerifier`], which recomputes digests over a range and reports
//!   the first tampered entry

pub mod error;
pub mod journal;
pub mod ledger;
pub mod traits;
pub mod verify;

pub use error::LedgerError;
pub use journal::{FileJournal, Journal, JournalConfig, MemoryJournal, SyncMode};
pub use ledger::Ledger;
pub use traits::{LedgerReader, LedgerWriter};
pub use verify::{ChainVerifier, VerificationResult};
