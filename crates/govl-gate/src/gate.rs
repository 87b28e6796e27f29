use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use govl_ledger::{LedgerReader, LedgerWriter};
use govl_types::{EntryDraft, EntryKind, LedgerEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GateConfig;
use crate::error::GateError;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Whether live predictions are permitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Active,
    Paused,
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::Paused => f.write_str("PAUSED"),
        }
    }
}

/// A requested gate transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateAction {
    Pause,
    Resume,
}

impl fmt::Display for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pause => f.write_str("pause"),
            Self::Resume => f.write_str("resume"),
        }
    }
}

/// Current gate status and the ledger entry that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelGateState {
    pub status: GateStatus,
    /// `None` until the first transition is recorded.
    pub last_transition_sequence: Option<u64>,
}

impl ModelGateState {
    /// The initial state: active, never transitioned.
    pub const fn initial() -> Self {
        Self {
            status: GateStatus::Active,
            last_transition_sequence: None,
        }
    }

    /// Rebuild the state from the last gate transition in `entries`.
    pub fn from_entries<'a>(entries: impl DoubleEndedIterator<Item = &'a LedgerEntry>) -> Self {
        entries
            .rev()
            .find_map(|entry| {
                let status = match entry.kind {
                    EntryKind::GatePaused => GateStatus::Paused,
                    EntryKind::GateResumed => GateStatus::Active,
                    EntryKind::Decision => return None,
                };
                Some(Self {
                    status,
                    last_transition_sequence: Some(entry.sequence),
                })
            })
            .unwrap_or_else(Self::initial)
    }
}

impl Default for ModelGateState {
    fn default() -> Self {
        Self::initial()
    }
}

// ---------------------------------------------------------------------------
// ModelGate
// ---------------------------------------------------------------------------

/// Audited switch over live predictions.
///
/// Transitions hold the gate's write lock across the ledger append, so the
/// recorded entry and the in-memory state never disagree. A failed append
/// leaves the state untouched.
pub struct ModelGate<L> {
    ledger: Arc<L>,
    state: RwLock<ModelGateState>,
    config: GateConfig,
}

impl<L: LedgerWriter + LedgerReader> ModelGate<L> {
    /// Create a gate over a ledger, recovering its state from any gate
    /// transitions the ledger already holds.
    pub fn new(ledger: Arc<L>, config: GateConfig) -> Result<Self, GateError> {
        let state = Self::recover(ledger.as_ref())?;
        debug!(status = %state.status, since = ?state.last_transition_sequence, "model gate ready");
        Ok(Self {
            ledger,
            state: RwLock::new(state),
            config,
        })
    }

    /// Rebuild the gate state from the ledger.
    pub fn recover(reader: &L) -> Result<ModelGateState, GateError> {
        let entries = reader.read_all()?;
        Ok(ModelGateState::from_entries(entries.iter()))
    }

    /// Pause live predictions. Permitted only while active.
    pub fn pause(&self, reason: impl Into<String>) -> Result<LedgerEntry, GateError> {
        self.transition(GateAction::Pause, reason.into())
    }

    /// Resume live predictions with the configured reason. Permitted only
    /// while paused.
    pub fn resume(&self) -> Result<LedgerEntry, GateError> {
        self.transition(GateAction::Resume, self.config.resume_reason.clone())
    }

    /// Resume live predictions, recording the given reason.
    pub fn resume_with_reason(&self, reason: impl Into<String>) -> Result<LedgerEntry, GateError> {
        self.transition(GateAction::Resume, reason.into())
    }

    /// Whether live predictions are currently permitted.
    pub fn predict_allowed(&self) -> bool {
        self.read_state().status == GateStatus::Active
    }

    /// A copy of the current state.
    pub fn state(&self) -> ModelGateState {
        *self.read_state()
    }

    /// Admit one decision.
    ///
    /// While the returned [`Admission`] is held no transition can complete,
    /// so a decision appended under it cannot interleave with a pause.
    pub fn admit(&self) -> Result<Admission<'_>, GateError> {
        let guard = self.read_state();
        let ModelGateState {
            status,
            last_transition_sequence,
        } = *guard;
        match status {
            GateStatus::Active => Ok(Admission { _state: guard }),
            GateStatus::Paused => Err(GateError::ModelPaused {
                since: last_transition_sequence,
            }),
        }
    }

    /// The ledger the gate records into.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    // The state is only replaced whole, after a successful append.
    fn read_state(&self) -> RwLockReadGuard<'_, ModelGateState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, attempted: GateAction, reason: String) -> Result<LedgerEntry, GateError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let (required, next, draft) = match attempted {
            GateAction::Pause => (
                GateStatus::Active,
                GateStatus::Paused,
                EntryDraft::gate_paused(reason),
            ),
            GateAction::Resume => (
                GateStatus::Paused,
                GateStatus::Active,
                EntryDraft::gate_resumed(reason),
            ),
        };

        if state.status != required {
            debug!(status = %state.status, %attempted, "rejected gate transition");
            return Err(GateError::InvalidTransition {
                status: state.status,
                attempted,
            });
        }

        let entry = self.ledger.append(draft)?;
        *state = ModelGateState {
            status: next,
            last_transition_sequence: Some(entry.sequence),
        };

        info!(
            status = %next,
            sequence = entry.sequence,
            reason = entry.reason().unwrap_or_default(),
            "model gate transition recorded"
        );
        Ok(entry)
    }
}

/// Proof that the gate was active, held while a decision is recorded.
pub struct Admission<'a> {
    _state: RwLockReadGuard<'a, ModelGateState>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use govl_ledger::{ChainVerifier, Journal, Ledger, LedgerError};
    use govl_types::{DecisionDraft, Outcome};

    fn gate() -> ModelGate<Ledger> {
        ModelGate::new(Arc::new(Ledger::in_memory()), GateConfig::default()).unwrap()
    }

    #[test]
    fn starts_active_without_history() {
        let gate = gate();
        assert!(gate.predict_allowed());
        assert_eq!(gate.state(), ModelGateState::initial());
    }

    #[test]
    fn pause_then_resume() {
        let gate = gate();

        let paused = gate.pause("disparate impact below threshold").unwrap();
        assert_eq!(paused.kind, EntryKind::GatePaused);
        assert_eq!(paused.reason(), Some("disparate impact below threshold"));
        assert!(!gate.predict_allowed());
        assert_eq!(gate.state().last_transition_sequence, Some(paused.sequence));

        let resumed = gate.resume().unwrap();
        assert_eq!(resumed.kind, EntryKind::GateResumed);
        assert_eq!(resumed.reason(), Some("resumed by operator"));
        assert!(gate.predict_allowed());
        assert_eq!(gate.state().last_transition_sequence, Some(resumed.sequence));

        assert!(ChainVerifier::verify_all(gate.ledger().as_ref()).unwrap().ok);
    }

    #[test]
    fn double_pause_is_rejected_without_side_effects() {
        let gate = gate();
        gate.pause("first").unwrap();
        let length = gate.ledger().length();

        let err = gate.pause("second").unwrap_err();
        assert!(matches!(
            err,
            GateError::InvalidTransition {
                status: GateStatus::Paused,
                attempted: GateAction::Pause,
            }
        ));
        assert!(!gate.predict_allowed());
        assert_eq!(gate.ledger().length(), length);
    }

    #[test]
    fn resume_while_active_is_rejected() {
        let gate = gate();
        let err = gate.resume().unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(gate.ledger().length(), 0);
        assert_eq!(
            err.to_string(),
            "cannot resume while the model gate is ACTIVE"
        );
    }

    #[test]
    fn admission_follows_status() {
        let gate = gate();
        assert!(gate.admit().is_ok());

        let paused = gate.pause("review").unwrap();
        match gate.admit() {
            Err(GateError::ModelPaused { since }) => assert_eq!(since, Some(paused.sequence)),
            _ => panic!("expected ModelPaused"),
        };
    }

    #[test]
    fn state_is_recovered_from_ledger() {
        let ledger = Arc::new(Ledger::in_memory());
        ledger
            .append(EntryDraft::decision(DecisionDraft::new(
                "credit-v1",
                Outcome::Approve,
                0.7,
            )))
            .unwrap();
        ledger.append(EntryDraft::gate_paused("audit")).unwrap();
        ledger
            .append(EntryDraft::decision(DecisionDraft::new(
                "credit-v1",
                Outcome::Deny,
                0.1,
            )))
            .unwrap();

        let gate = ModelGate::new(ledger, GateConfig::default()).unwrap();
        assert_eq!(
            gate.state(),
            ModelGateState {
                status: GateStatus::Paused,
                last_transition_sequence: Some(2),
            }
        );
    }

    struct BrokenJournal;

    impl Journal for BrokenJournal {
        fn load(&mut self) -> Result<Vec<LedgerEntry>, LedgerError> {
            Ok(Vec::new())
        }

        fn persist(&mut self, _entry: &LedgerEntry) -> Result<(), LedgerError> {
            Err(LedgerError::Storage("read-only volume".into()))
        }
    }

    #[test]
    fn failed_append_leaves_state_unchanged() {
        let ledger = Arc::new(Ledger::with_journal(BrokenJournal).unwrap());
        let gate = ModelGate::new(ledger, GateConfig::default()).unwrap();

        let err = gate.pause("maintenance").unwrap_err();
        assert!(matches!(err, GateError::Ledger(ref e) if e.is_storage()));
        assert!(gate.predict_allowed());
        assert_eq!(gate.state(), ModelGateState::initial());
    }
}
