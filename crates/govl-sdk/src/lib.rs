//! High-level SDK for the Governance Ledger.
//!
//! [`Governance`] ties the ledger store, the model gate, and the fairness
//! monitor together behind one handle. This is the main entry point for a
//! scoring service embedding GOVL.
//!
//! ```rust
//! use govl_sdk::{DecisionDraft, Governance, Outcome};
//!
//! let gov = Governance::in_memory().unwrap();
//! gov.record_decision(
//!     DecisionDraft::new("credit-v1", Outcome::Approve, 0.82).with_input("gender", "F"),
//! )
//! .unwrap();
//! assert!(gov.verify_all().unwrap().ok);
//! ```

pub mod config;
pub mod error;
pub mod governance;

pub use config::{GovernanceConfig, LedgerSettings};
pub use error::{GovernanceError, GovernanceResult};
pub use governance::{Governance, GovernanceLedger};

// Re-export key types
pub use govl_fairness::{FairnessPolicy, FairnessSnapshot, LedgerSummary};
pub use govl_gate::{GateConfig, GateStatus, ModelGateState};
pub use govl_ledger::{LedgerError, SyncMode, VerificationResult};
pub use govl_types::{
    DecisionDraft, EntryDraft, EntryHash, EntryKind, EntryPayload, LedgerEntry, Outcome,
};
