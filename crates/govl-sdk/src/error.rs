use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("ledger error: {0}")]
    Ledger(#[from] govl_ledger::LedgerError),

    #[error("gate error: {0}")]
    Gate(#[from] govl_gate::GateError),

    #[error("fairness error: {0}")]
    Fairness(#[from] govl_fairness::FairnessError),
}

impl GovernanceError {
    /// The decision was refused because live predictions are paused.
    pub fn is_model_paused(&self) -> bool {
        matches!(self, Self::Gate(govl_gate::GateError::ModelPaused { .. }))
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::Gate(e) if e.is_invalid_transition())
    }
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;
