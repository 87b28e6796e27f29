use serde::{Deserialize, Serialize};

/// Configuration for the model gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Reason recorded on `GATE_RESUMED` entries when the caller gives none.
    pub resume_reason: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            resume_reason: "resumed by operator".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: GateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GateConfig::default());
    }
}
