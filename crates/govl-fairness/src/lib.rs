//! Fairness monitor for the Governance Ledger.
//!
//! Everything here is a pure function of a ledger snapshot: a run of entries
//! read up to a frozen length. Nothing is stored, so two callers holding the
//! same snapshot always get the same answer.
//!
//! - [`FairnessMonitor::compute`] — group-wise approval rates, the disparate
//!   impact ratio, statistical parity difference, and bias alerts
//! - [`summarize`] — decision and gate-transition totals for dashboards

pub mod error;
pub mod monitor;
pub mod policy;
pub mod summary;

pub use error::FairnessError;
pub use monitor::{AlertMetric, BiasAlert, FairnessMonitor, FairnessSnapshot, GroupRate};
pub use policy::FairnessPolicy;
pub use summary::{summarize, LedgerSummary};
