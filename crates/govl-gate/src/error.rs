use govl_ledger::LedgerError;

use crate::gate::{GateAction, GateStatus};

/// Errors that can occur at the model gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// `pause` while paused, or `resume` while active. Nothing was recorded.
    #[error("cannot {attempted} while the model gate is {status}")]
    InvalidTransition {
        status: GateStatus,
        attempted: GateAction,
    },

    /// A decision was offered while live predictions are paused.
    #[error("model is paused (since seq {since:?}); live predictions are not permitted")]
    ModelPaused { since: Option<u64> },

    /// Recording the transition failed; the gate state is unchanged.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl GateError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
