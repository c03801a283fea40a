use thiserror::Error;

#[derive(Error, Debug)]
pub enum KuhnError {
    #[error("Invalid card: {0}")]
    InvalidCard(String),

    #[error("Invalid history: {0:?}")]
    InvalidHistory(String),

    #[error("No decision at terminal history {0:?}")]
    NoDecision(String),

    #[error("History {0:?} is not terminal")]
    NotTerminal(String),

    #[error("Malformed distribution for {state}: {reason}")]
    MalformedDistribution { state: String, reason: String },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type KuhnResult<T> = Result<T, KuhnError>;
