/// Errors from fairness computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FairnessError {
    #[error("{name} must be a finite positive number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("group key must not be empty")]
    EmptyGroupKey,
}
