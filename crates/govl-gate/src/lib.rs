//! Model availability gate for the Governance Ledger.
//!
//! The gate records whether live predictions are currently permitted. Every
//! change of state is itself appended to the ledger, so pauses and resumes
//! are audited alongside the decisions they govern.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use govl_gate::{GateConfig, ModelGate};
//! use govl_ledger::Ledger;
//!
//! let gate = ModelGate::new(Arc::new(Ledger::in_memory()), GateConfig::default()).unwrap();
//! gate.pause("fairness review").unwrap();
//! assert!(!gate.predict_allowed());
//! gate.resume().unwrap();
//! assert!(gate.predict_allowed());
//! ```

pub mod config;
pub mod error;
pub mod gate;

pub use config::GateConfig;
pub use error::GateError;
pub use gate::{Admission, GateAction, GateStatus, ModelGate, ModelGateState};
