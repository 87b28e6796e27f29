use std::collections::BTreeMap;

use govl_types::{EntryKind, EntryPayload, LedgerEntry};
use serde::Serialize;

/// Totals over a ledger snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub entries: u64,
    pub decisions: u64,
    pub approvals: u64,
    pub denials: u64,
    pub gate_pauses: u64,
    pub gate_resumes: u64,
    /// Decision count per model version.
    pub model_versions: BTreeMap<String, u64>,
}

impl LedgerSummary {
    /// Share of decisions that were approvals, if there were any decisions.
    pub fn approval_rate(&self) -> Option<f64> {
        (self.decisions > 0).then(|| self.approvals as f64 / self.decisions as f64)
    }
}

/// Count decisions and gate transitions in `snapshot`.
pub fn summarize(snapshot: &[LedgerEntry]) -> LedgerSummary {
    let mut summary = LedgerSummary {
        entries: snapshot.len() as u64,
        ..Default::default()
    };

    for entry in snapshot {
        match (&entry.kind, &entry.payload) {
            (EntryKind::Decision, EntryPayload::Decision(decision)) => {
                summary.decisions += 1;
                if decision.outcome.is_approved() {
                    summary.approvals += 1;
                } else {
                    summary.denials += 1;
                }
                *summary
                    .model_versions
                    .entry(decision.model_version.clone())
                    .or_default() += 1;
            }
            (EntryKind::GatePaused, _) => summary.gate_pauses += 1,
            (EntryKind::GateResumed, _) => summary.gate_resumes += 1,
            // A decision kind without a decision payload only exists in a
            // tampered ledger; verification reports it.
            (EntryKind::Decision, EntryPayload::Gate { .. }) => {}
        }
    }
    summary
}
