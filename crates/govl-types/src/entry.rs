use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EncodingError;
use crate::hash::EntryHash;
use crate::temporal::EntryTimestamp;

// ---------------------------------------------------------------------------
// Kinds and outcomes
// ---------------------------------------------------------------------------

/// The closed set of events the ledger records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// A scoring decision produced by the model.
    Decision,
    /// Live predictions were paused by an operator.
    GatePaused,
    /// Live predictions were resumed by an operator.
    GateResumed,
}

impl EntryKind {
    /// Stable one-byte tag used in the canonical encoding.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Decision => 1,
            Self::GatePaused => 2,
            Self::GateResumed => 3,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "DECISION",
            Self::GatePaused => "GATE_PAUSED",
            Self::GateResumed => "GATE_RESUMED",
        }
    }

    /// Returns `true` for gate transitions.
    pub fn is_gate(&self) -> bool {
        matches!(self, Self::GatePaused | Self::GateResumed)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The model's output decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Approve,
    Deny,
}

impl Outcome {
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Approve => 1,
            Self::Deny => 2,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => f.write_str("APPROVE"),
            Self::Deny => f.write_str("DENY"),
        }
    }
}

// ---------------------------------------------------------------------------
// Decision drafts and payloads
// ---------------------------------------------------------------------------

/// A scoring decision as submitted by the scoring service.
///
/// `inputs` is the snapshot of model inputs the decision was made on. Keys are
/// kept sorted so the snapshot has one canonical form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionDraft {
    pub inputs: BTreeMap<String, Value>,
    pub model_version: String,
    pub outcome: Outcome,
    pub probability: f64,
}

impl DecisionDraft {
    /// A decision with no recorded inputs.
    pub fn new(model_version: impl Into<String>, outcome: Outcome, probability: f64) -> Self {
        Self {
            inputs: BTreeMap::new(),
            model_version: model_version.into(),
            outcome,
            probability,
        }
    }

    /// Add one input field to the snapshot.
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    /// Reject fields that cannot be canonically encoded.
    pub fn validate(&self) -> Result<(), EncodingError> {
        if !self.probability.is_finite() || !(0.0..=1.0).contains(&self.probability) {
            return Err(EncodingError::ProbabilityOutOfRange(self.probability));
        }
        if self.model_version.trim().is_empty() {
            return Err(EncodingError::EmptyModelVersion);
        }
        if self.inputs.keys().any(|name| name.is_empty()) {
            return Err(EncodingError::EmptyFieldName);
        }
        Ok(())
    }
}

/// Kind-specific content of an entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryPayload {
    Decision(DecisionDraft),
    Gate { reason: String },
}

impl EntryPayload {
    fn variant_name(&self) -> &'static str {
        match self {
            Self::Decision(_) => "decision",
            Self::Gate { .. } => "gate",
        }
    }
}

// ---------------------------------------------------------------------------
// Drafts and entries
// ---------------------------------------------------------------------------

/// An entry as submitted to the store, before it has a place in the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub kind: EntryKind,
    pub payload: EntryPayload,
}

impl EntryDraft {
    pub fn decision(draft: DecisionDraft) -> Self {
        Self {
            kind: EntryKind::Decision,
            payload: EntryPayload::Decision(draft),
        }
    }

    pub fn gate_paused(reason: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::GatePaused,
            payload: EntryPayload::Gate {
                reason: reason.into(),
            },
        }
    }

    pub fn gate_resumed(reason: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::GateResumed,
            payload: EntryPayload::Gate {
                reason: reason.into(),
            },
        }
    }

    /// Check that the kind agrees with the payload and the payload is well formed.
    pub fn validate(&self) -> Result<(), EncodingError> {
        validate_kind_payload(self.kind, &self.payload)
    }
}

impl From<DecisionDraft> for EntryDraft {
    fn from(draft: DecisionDraft) -> Self {
        Self::decision(draft)
    }
}

/// Every entry field that the entry digest covers.
///
/// This is everything except `previous_hash`, which the digest chains over
/// separately, and `entry_hash` itself.
#[derive(Clone, Copy, Debug)]
pub struct EntryFields<'a> {
    pub sequence: u64,
    pub timestamp: EntryTimestamp,
    pub kind: EntryKind,
    pub payload: &'a EntryPayload,
}

impl EntryFields<'_> {
    pub fn validate(&self) -> Result<(), EncodingError> {
        validate_kind_payload(self.kind, self.payload)
    }
}

/// One audited event in the chain.
///
/// Entries are created only by the ledger store and never change after they
/// are appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub sequence: u64,
    pub timestamp: EntryTimestamp,
    pub kind: EntryKind,
    pub payload: EntryPayload,
    pub previous_hash: EntryHash,
    pub entry_hash: EntryHash,
}

impl LedgerEntry {
    /// The fields covered by `entry_hash`.
    pub fn fields(&self) -> EntryFields<'_> {
        EntryFields {
            sequence: self.sequence,
            timestamp: self.timestamp,
            kind: self.kind,
            payload: &self.payload,
        }
    }

    /// The decision recorded by this entry, if it is one.
    pub fn decision(&self) -> Option<&DecisionDraft> {
        match (&self.kind, &self.payload) {
            (EntryKind::Decision, EntryPayload::Decision(d)) => Some(d),
            _ => None,
        }
    }

    /// The operator's reason, for gate transitions.
    pub fn reason(&self) -> Option<&str> {
        match &self.payload {
            EntryPayload::Gate { reason } if self.kind.is_gate() => Some(reason),
            _ => None,
        }
    }
}

fn validate_kind_payload(kind: EntryKind, payload: &EntryPayload) -> Result<(), EncodingError> {
    match (kind, payload) {
        (EntryKind::Decision, EntryPayload::Decision(d)) => d.validate(),
        (EntryKind::GatePaused | EntryKind::GateResumed, EntryPayload::Gate { .. }) => Ok(()),
        (kind, payload) => Err(EncodingError::KindMismatch {
            kind,
            payload: payload.variant_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approve(probability: f64) -> DecisionDraft {
        DecisionDraft::new("credit-v1", Outcome::Approve, probability)
            .with_input("income", 52_000)
            .with_input("region", "north")
    }

    #[test]
    fn valid_decision_passes() {
        assert!(EntryDraft::decision(approve(0.73)).validate().is_ok());
    }

    #[test]
    fn probability_bounds_are_inclusive() {
        assert!(approve(0.0).validate().is_ok());
        assert!(approve(1.0).validate().is_ok());
        assert_eq!(
            approve(1.5).validate(),
            Err(EncodingError::ProbabilityOutOfRange(1.5))
        );
        assert!(approve(f64::NAN).validate().is_err());
        assert!(approve(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn empty_model_version_rejected() {
        let draft = DecisionDraft::new("  ", Outcome::Deny, 0.2);
        assert_eq!(draft.validate(), Err(EncodingError::EmptyModelVersion));
    }

    #[test]
    fn empty_input_name_rejected() {
        let draft = approve(0.5).with_input("", 1);
        assert_eq!(draft.validate(), Err(EncodingError::EmptyFieldName));
    }

    #[test]
    fn kind_payload_mismatch_rejected() {
        let draft = EntryDraft {
            kind: EntryKind::GatePaused,
            payload: EntryPayload::Decision(approve(0.5)),
        };
        assert_eq!(
            draft.validate(),
            Err(EncodingError::KindMismatch {
                kind: EntryKind::GatePaused,
                payload: "decision",
            })
        );
    }

    #[test]
    fn gate_drafts_carry_reason() {
        let draft = EntryDraft::gate_paused("drift detected");
        assert_eq!(draft.kind, EntryKind::GatePaused);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn kinds_serialize_screaming_case() {
        let json = serde_json::to_string(&EntryKind::GateResumed).unwrap();
        assert_eq!(json, "\"GATE_RESUMED\"");
        assert_eq!(serde_json::to_string(&Outcome::Deny).unwrap(), "\"DENY\"");
    }

    #[test]
    fn entry_accessors_follow_kind() {
        let entry = LedgerEntry {
            sequence: 1,
            timestamp: EntryTimestamp::new(10, 0),
            kind: EntryKind::GatePaused,
            payload: EntryPayload::Gate {
                reason: "audit".into(),
            },
            previous_hash: EntryHash::GENESIS,
            entry_hash: EntryHash::from_hash([1; 32]),
        };
        assert_eq!(entry.reason(), Some("audit"));
        assert!(entry.decision().is_none());
    }

    proptest! {
        #[test]
        fn entries_survive_json_storage(
            probability in 0.0f64..=1.0,
            income in any::<i64>(),
            score in -1.0e12f64..1.0e12,
        ) {
            let draft = DecisionDraft::new("credit-v1", Outcome::Approve, probability)
                .with_input("income", income)
                .with_input("score", score);
            let entry = LedgerEntry {
                sequence: 4,
                timestamp: EntryTimestamp::new(99, 2),
                kind: EntryKind::Decision,
                payload: EntryPayload::Decision(draft),
                previous_hash: EntryHash::from_hash([3; 32]),
                entry_hash: EntryHash::from_hash([4; 32]),
            };
            let json = serde_json::to_vec(&entry).unwrap();
            let back: LedgerEntry = serde_json::from_slice(&json).unwrap();
            prop_assert_eq!(back, entry);
        }
    }
}
