use std::path::PathBuf;

use thiserror::Error;

pub type RiskResult<T> = Result<T, RiskError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskError {
    #[error("unknown {field} category {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRangeInput {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("classifier returned label code {0} with no target class")]
    UnknownLabel(i64),

    #[error("expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("failed to load {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },
}
