use std::fs;
use std::path::{Path, PathBuf};

use govl_fairness::FairnessPolicy;
use govl_gate::GateConfig;
use govl_ledger::{JournalConfig, SyncMode};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};

/// Top-level configuration, usually read from `govl.toml`.
///
/// Every field has a default, so an empty file is a valid configuration
/// describing an in-memory ledger with the four-fifths screening rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub ledger: LedgerSettings,
    pub fairness: FairnessPolicy,
    pub gate: GateConfig,
}

/// Where and how durably the ledger is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Ledger file. `None` keeps the chain in memory.
    pub path: Option<PathBuf>,
    pub sync: SyncMode,
}

impl LedgerSettings {
    pub fn journal_config(&self) -> JournalConfig {
        JournalConfig { sync: self.sync }
    }
}

impl GovernanceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> GovernanceResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> GovernanceResult<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            GovernanceError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> GovernanceResult<()> {
        self.fairness.validate()?;
        if self.gate.resume_reason.trim().is_empty() {
            return Err(GovernanceError::Config(
                "gate.resume_reason must not be empty".into(),
            ));
        }
        Ok(())
    }
}
