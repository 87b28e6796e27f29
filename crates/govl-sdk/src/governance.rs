use std::path::Path;
use std::sync::Arc;

use govl_fairness::{summarize, FairnessMonitor, FairnessPolicy, FairnessSnapshot, LedgerSummary};
use govl_gate::{ModelGate, ModelGateState};
use govl_ledger::{
    ChainVerifier, FileJournal, Journal, Ledger, LedgerReader, LedgerWriter, MemoryJournal,
    VerificationResult,
};
use govl_types::{DecisionDraft, EntryDraft, LedgerEntry};
use tracing::{debug, info, warn};

use crate::config::GovernanceConfig;
use crate::error::GovernanceResult;

/// The ledger behind a [`Governance`] handle: memory or file, chosen at
/// runtime from configuration.
pub type GovernanceLedger = Ledger<Box<dyn Journal>>;

/// High-level Governance Ledger API.
pub struct Governance {
    gate: ModelGate<GovernanceLedger>,
    policy: FairnessPolicy,
}

impl Governance {
    /// A governance handle over an in-memory ledger with default settings.
    pub fn in_memory() -> GovernanceResult<Self> {
        Self::from_config(GovernanceConfig::default())
    }

    /// Open (or create) a file-backed ledger at `path` with default settings.
    pub fn open(path: &Path) -> GovernanceResult<Self> {
        let mut config = GovernanceConfig::default();
        config.ledger.path = Some(path.to_path_buf());
        Self::from_config(config)
    }

    /// Build a governance handle from configuration.
    pub fn from_config(config: GovernanceConfig) -> GovernanceResult<Self> {
        config.validate()?;
        let journal: Box<dyn Journal> = match &config.ledger.path {
            Some(path) => Box::new(FileJournal::open(path, config.ledger.journal_config())?),
            None => Box::new(MemoryJournal),
        };
        let ledger = Ledger::with_journal(journal)?;
        let gate = ModelGate::new(Arc::new(ledger), config.gate)?;
        info!(
            entries = gate.ledger().length(),
            status = %gate.state().status,
            "governance ledger ready"
        );
        Ok(Self {
            gate,
            policy: config.fairness,
        })
    }

    // ---- Recording ----

    /// Record one scoring decision, refusing it while the model is paused.
    ///
    /// The gate is held in its active state until the entry is durable, so a
    /// concurrent `pause` is ordered strictly before or after this decision.
    pub fn record_decision(&self, decision: DecisionDraft) -> GovernanceResult<LedgerEntry> {
        let _admission = self.gate.admit().inspect_err(|_| {
            debug!(model_version = %decision.model_version, "decision refused by model gate");
        })?;
        let entry = self.ledger().append(EntryDraft::decision(decision))?;
        Ok(entry)
    }

    /// Append a decision without consulting the gate.
    ///
    /// Gate transitions are not accepted here: they enter the ledger only
    /// through [`Governance::pause`] and [`Governance::resume`], which keep
    /// the live gate state in step with the chain.
    pub fn append(&self, decision: DecisionDraft) -> GovernanceResult<LedgerEntry> {
        Ok(self.ledger().append(EntryDraft::decision(decision))?)
    }

    // ---- Reading ----

    pub fn length(&self) -> u64 {
        self.ledger().length()
    }

    pub fn read_range(&self, from: u64, to: u64) -> GovernanceResult<Vec<LedgerEntry>> {
        Ok(self.ledger().read_range(from, to)?)
    }

    pub fn entry(&self, sequence: u64) -> Option<LedgerEntry> {
        self.ledger().entry(sequence)
    }

    /// The most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> GovernanceResult<Vec<LedgerEntry>> {
        Ok(self.ledger().recent(limit)?)
    }

    // ---- Verification ----

    pub fn verify(&self, from: u64, to: u64) -> GovernanceResult<VerificationResult> {
        Ok(ChainVerifier::verify(self.ledger(), from, to)?)
    }

    pub fn verify_all(&self) -> GovernanceResult<VerificationResult> {
        Ok(ChainVerifier::verify_all(self.ledger())?)
    }

    // ---- Model gate ----

    pub fn pause(&self, reason: impl Into<String>) -> GovernanceResult<LedgerEntry> {
        Ok(self.gate.pause(reason)?)
    }

    pub fn resume(&self) -> GovernanceResult<LedgerEntry> {
        Ok(self.gate.resume()?)
    }

    pub fn resume_with_reason(&self, reason: impl Into<String>) -> GovernanceResult<LedgerEntry> {
        Ok(self.gate.resume_with_reason(reason)?)
    }

    pub fn predict_allowed(&self) -> bool {
        self.gate.predict_allowed()
    }

    pub fn gate_state(&self) -> ModelGateState {
        self.gate.state()
    }

    // ---- Fairness ----

    /// Fairness of every decision recorded so far, screened against the
    /// configured policy with `threshold` as the disparate impact limit.
    pub fn compute_fairness(
        &self,
        group_key: &str,
        threshold: f64,
    ) -> GovernanceResult<FairnessSnapshot> {
        let policy = FairnessPolicy {
            disparate_impact_threshold: threshold,
            ..self.policy.clone()
        };
        self.fairness_with(group_key, &policy)
    }

    /// Fairness of every decision recorded so far under the configured policy.
    pub fn fairness(&self, group_key: &str) -> GovernanceResult<FairnessSnapshot> {
        self.fairness_with(group_key, &self.policy)
    }

    fn fairness_with(
        &self,
        group_key: &str,
        policy: &FairnessPolicy,
    ) -> GovernanceResult<FairnessSnapshot> {
        let snapshot = self.ledger().read_all()?;
        let report = FairnessMonitor::compute(&snapshot, group_key, policy)?;
        if report.alert {
            warn!(
                group_key,
                ratio = ?report.disparate_impact_ratio,
                alerts = report.alerts.len(),
                "bias alert"
            );
        }
        Ok(report)
    }

    /// Decision and gate-transition totals.
    pub fn summary(&self) -> GovernanceResult<LedgerSummary> {
        Ok(summarize(&self.ledger().read_all()?))
    }

    // ---- Accessors ----

    pub fn ledger(&self) -> &GovernanceLedger {
        self.gate.ledger()
    }

    pub fn policy(&self) -> &FairnessPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govl_types::{EntryKind, Outcome};
    use serde_json::json;

    fn decision(group: &str, outcome: Outcome) -> DecisionDraft {
        DecisionDraft::new("credit-v1", outcome, 0.6).with_input("gender", group)
    }

    #[test]
    fn in_memory_starts_empty_and_active() {
        let gov = Governance::in_memory().unwrap();
        assert_eq!(gov.length(), 0);
        assert!(gov.predict_allowed());
        assert!(gov.verify(1, 0).unwrap().ok);
    }

    #[test]
    fn record_verify_and_read_back() {
        let gov = Governance::in_memory().unwrap();
        let first = gov.record_decision(decision("F", Outcome::Approve)).unwrap();
        let second = gov
            .record_decision(decision("M", Outcome::Deny).with_input("income", json!(52_000)))
            .unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.previous_hash, first.entry_hash);
        assert_eq!(gov.read_range(1, 2).unwrap(), vec![first, second.clone()]);
        assert_eq!(gov.recent(1).unwrap(), vec![second]);
        assert!(gov.verify_all().unwrap().ok);
    }

    #[test]
    fn paused_model_refuses_decisions() {
        let gov = Governance::in_memory().unwrap();
        gov.pause("bias alert").unwrap();

        let err = gov.record_decision(decision("F", Outcome::Approve)).unwrap_err();
        assert!(err.is_model_paused());
        assert_eq!(gov.length(), 1);

        gov.resume().unwrap();
        gov.record_decision(decision("F", Outcome::Approve)).unwrap();
        assert_eq!(gov.length(), 3);
    }

    #[test]
    fn ungated_append_leaves_gate_state_alone() {
        let gov = Governance::in_memory().unwrap();
        let entry = gov.append(decision("F", Outcome::Deny)).unwrap();
        assert_eq!(entry.kind, EntryKind::Decision);
        assert!(gov.predict_allowed());
        assert_eq!(gov.gate_state().last_transition_sequence, None);

        gov.pause("review").unwrap();
        let entry = gov.append(decision("M", Outcome::Approve)).unwrap();
        assert_eq!(entry.kind, EntryKind::Decision);
        assert!(!gov.predict_allowed());
        assert_eq!(gov.gate_state().last_transition_sequence, Some(2));
    }

    #[test]
    fn invalid_transition_surfaces() {
        let gov = Governance::in_memory().unwrap();
        assert!(gov.resume().unwrap_err().is_invalid_transition());
    }

    #[test]
    fn fairness_and_summary_over_recorded_decisions() {
        let gov = Governance::in_memory().unwrap();
        for _ in 0..3 {
            gov.record_decision(decision("A", Outcome::Approve)).unwrap();
        }
        gov.record_decision(decision("A", Outcome::Deny)).unwrap();
        gov.record_decision(decision("B", Outcome::Approve)).unwrap();
        gov.record_decision(decision("B", Outcome::Deny)).unwrap();
        gov.pause("review").unwrap();

        let report = gov.compute_fairness("gender", 0.8).unwrap();
        assert_eq!(report.snapshot_length, 7);
        assert_eq!(report.approval_rate("A"), Some(0.75));
        assert_eq!(report.approval_rate("B"), Some(0.5));
        assert!(report.alert);
        assert!(!gov.compute_fairness("gender", 0.6).unwrap().alert);

        let summary = gov.summary().unwrap();
        assert_eq!(summary.decisions, 6);
        assert_eq!(summary.approvals, 4);
        assert_eq!(summary.gate_pauses, 1);
        assert_eq!(gov.recent(1).unwrap()[0].kind, EntryKind::GatePaused);
    }
}
