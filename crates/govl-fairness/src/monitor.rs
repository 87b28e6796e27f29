use std::collections::BTreeMap;

use govl_types::LedgerEntry;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FairnessError;
use crate::policy::FairnessPolicy;

/// Approval counts for one value of the protected attribute.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupRate {
    pub group: String,
    pub approvals: u64,
    pub total: u64,
    pub approval_rate: f64,
}

/// The metric that raised an alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    DisparateImpact,
    StatisticalParityDifference,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BiasAlert {
    pub metric: AlertMetric,
    pub value: f64,
    pub threshold: f64,
}

/// Fairness of the decisions in one ledger snapshot. Derived, never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FairnessSnapshot {
    /// The protected attribute the decisions were partitioned by.
    pub group_key: String,
    /// Number of ledger entries in the snapshot.
    pub snapshot_length: u64,
    /// Groups with at least one decision, ordered by group value.
    pub groups: Vec<GroupRate>,
    /// Decisions whose inputs did not carry the group key.
    pub unattributed: u64,
    /// Minimum `rate_i / rate_j` over ordered pairs of distinct groups with
    /// `rate_j > 0`. `None` when fewer than two groups are present or every
    /// rate is zero.
    pub disparate_impact_ratio: Option<f64>,
    /// Highest minus lowest approval rate. `None` with fewer than two groups.
    pub statistical_parity_difference: Option<f64>,
    pub alert: bool,
    pub alerts: Vec<BiasAlert>,
}

impl FairnessSnapshot {
    /// Approval rate of one group, if it has any decisions in the snapshot.
    pub fn approval_rate(&self, group: &str) -> Option<f64> {
        self.groups
            .iter()
            .find(|g| g.group == group)
            .map(|g| g.approval_rate)
    }
}

/// Stateless fairness computation over ledger snapshots.
pub struct FairnessMonitor;

impl FairnessMonitor {
    /// Partition the snapshot's decisions by `group_key` and screen the
    /// resulting approval rates against `policy`.
    ///
    /// Gate transitions are ignored. Groups are keyed by the input's string
    /// value, or its JSON text for non-string values; a missing or null input
    /// leaves the decision unattributed.
    pub fn compute(
        snapshot: &[LedgerEntry],
        group_key: &str,
        policy: &FairnessPolicy,
    ) -> Result<FairnessSnapshot, FairnessError> {
        if group_key.is_empty() {
            return Err(FairnessError::EmptyGroupKey);
        }
        policy.validate()?;

        let mut counts: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        let mut unattributed = 0;

        for decision in snapshot.iter().filter_map(LedgerEntry::decision) {
            let Some(group) = group_label(decision.inputs.get(group_key)) else {
                unattributed += 1;
                continue;
            };
            let (approvals, total) = counts.entry(group).or_default();
            *total += 1;
            if decision.outcome.is_approved() {
                *approvals += 1;
            }
        }

        let groups: Vec<GroupRate> = counts
            .into_iter()
            .map(|(group, (approvals, total))| GroupRate {
                group,
                approvals,
                total,
                approval_rate: approvals as f64 / total as f64,
            })
            .collect();

        let disparate_impact_ratio = disparate_impact(&groups);
        let statistical_parity_difference = parity_difference(&groups);

        let mut alerts = Vec::new();
        if let Some(ratio) = disparate_impact_ratio {
            if ratio < policy.disparate_impact_threshold {
                alerts.push(BiasAlert {
                    metric: AlertMetric::DisparateImpact,
                    value: ratio,
                    threshold: policy.disparate_impact_threshold,
                });
            }
        }
        if let (Some(spread), Some(threshold)) = (
            statistical_parity_difference,
            policy.parity_difference_threshold,
        ) {
            if spread > threshold {
                alerts.push(BiasAlert {
                    metric: AlertMetric::StatisticalParityDifference,
                    value: spread,
                    threshold,
                });
            }
        }

        debug!(
            group_key,
            groups = groups.len(),
            unattributed,
            ratio = ?disparate_impact_ratio,
            alerts = alerts.len(),
            "fairness computed"
        );

        Ok(FairnessSnapshot {
            group_key: group_key.to_string(),
            snapshot_length: snapshot.len() as u64,
            groups,
            unattributed,
            disparate_impact_ratio,
            statistical_parity_difference,
            alert: !alerts.is_empty(),
            alerts,
        })
    }
}

fn group_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn disparate_impact(groups: &[GroupRate]) -> Option<f64> {
    let mut ratio: Option<f64> = None;
    for (i, numerator) in groups.iter().enumerate() {
        for (j, denominator) in groups.iter().enumerate() {
            if i == j || denominator.approval_rate <= 0.0 {
                continue;
            }
            let r = numerator.approval_rate / denominator.approval_rate;
            ratio = Some(ratio.map_or(r, |current| current.min(r)));
        }
    }
    ratio
}

fn parity_difference(groups: &[GroupRate]) -> Option<f64> {
    if groups.len() < 2 {
        return None;
    }
    let rates = groups.iter().map(|g| g.approval_rate);
    let max = rates.clone().fold(f64::MIN, f64::max);
    let min = rates.fold(f64::MAX, f64::min);
    Some(max - min)
}
