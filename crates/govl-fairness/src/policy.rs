use serde::{Deserialize, Serialize};

use crate::error::FairnessError;

/// Screening thresholds for bias alerts.
///
/// Both are policy choices rather than regulatory constants, so they are
/// configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessPolicy {
    /// Alert when the disparate impact ratio falls below this value.
    pub disparate_impact_threshold: f64,
    /// Alert when the spread between the highest and lowest approval rate
    /// exceeds this value. Disabled when `None`.
    pub parity_difference_threshold: Option<f64>,
}

impl FairnessPolicy {
    /// The four-fifths screening rule.
    pub const DEFAULT_DISPARATE_IMPACT_THRESHOLD: f64 = 0.8;

    /// A policy with the given disparate impact threshold and no parity check.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            disparate_impact_threshold: threshold,
            parity_difference_threshold: None,
        }
    }

    pub fn validate(&self) -> Result<(), FairnessError> {
        check_threshold("disparate_impact_threshold", self.disparate_impact_threshold)?;
        if let Some(parity) = self.parity_difference_threshold {
            check_threshold("parity_difference_threshold", parity)?;
        }
        Ok(())
    }
}

impl Default for FairnessPolicy {
    fn default() -> Self {
        Self::with_threshold(Self::DEFAULT_DISPARATE_IMPACT_THRESHOLD)
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), FairnessError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FairnessError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_four_fifths_without_parity() {
        let policy = FairnessPolicy::default();
        assert_eq!(policy.disparate_impact_threshold, 0.8);
        assert!(policy.parity_difference_threshold.is_none());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_thresholds() {
        assert!(FairnessPolicy::with_threshold(0.0).validate().is_err());
        assert!(FairnessPolicy::with_threshold(f64::NAN).validate().is_err());

        let policy = FairnessPolicy {
            parity_difference_threshold: Some(-0.2),
            ..Default::default()
        };
        assert_eq!(
            policy.validate(),
            Err(FairnessError::InvalidThreshold {
                name: "parity_difference_threshold",
                value: -0.2
            })
        );
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let policy: FairnessPolicy =
            serde_json::from_str(r#"{"parity_difference_threshold": 0.2}"#).unwrap();
        assert_eq!(policy.disparate_impact_threshold, 0.8);
        assert_eq!(policy.parity_difference_threshold, Some(0.2));
    }
}
