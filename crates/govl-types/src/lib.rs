//! Foundation types for the Governance Ledger (GOVL).
//!
//! This crate provides the data model shared by every other GOVL crate: the
//! audited [`LedgerEntry`], its closed set of kinds and payloads, the 256-bit
//! [`EntryHash`] that links entries into a chain, and the hybrid
//! [`EntryTimestamp`] that keeps entry times ordered.
//!
//! # Key Types
//!
//! - [`LedgerEntry`] — One appended, hash-linked event
//! - [`EntryDraft`] — What a caller submits; the store assigns the rest
//! - [`DecisionDraft`] — A scoring decision as produced by the scoring service
//! - [`EntryHash`] — BLAKE3 digest; [`EntryHash::GENESIS`] anchors the chain
//! - [`EntryTimestamp`] — Wall-clock milliseconds plus a logical counter

pub mod entry;
pub mod error;
pub mod hash;
pub mod temporal;

pub use entry::{
    DecisionDraft, EntryDraft, EntryFields, EntryKind, EntryPayload, LedgerEntry, Outcome,
};
pub use error::EncodingError;
pub use hash::EntryHash;
pub use temporal::EntryTimestamp;
