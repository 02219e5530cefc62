use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegimyxError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RegimyxError>;

/// Non-fatal conditions raised while building a recommendation.
/// Each one is logged where it happens and carried on the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// The pool held fewer drugs than the requested combination size.
    CombinationSizeReduced { requested: usize, effective: usize },
    /// More than one curated record shares the same drug set; the first was used.
    DuplicateKnownCombination { drug_ids: Vec<String>, matches: usize },
    /// A candidate could not be scored and was left out of the ranking.
    CandidateDropped { drug_ids: Vec<String>, reason: String },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::CombinationSizeReduced { requested, effective } => write!(
                f,
                "combination size reduced from {requested} to {effective}: not enough drugs in pool"
            ),
            EngineWarning::DuplicateKnownCombination { drug_ids, matches } => write!(
                f,
                "{matches} curated records share drug set [{}]; using the first",
                drug_ids.join(", ")
            ),
            EngineWarning::CandidateDropped { drug_ids, reason } => {
                write!(f, "candidate [{}] dropped: {reason}", drug_ids.join(", "))
            }
        }
    }
}
