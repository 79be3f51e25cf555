//! Error types for the evaluation pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur during evaluation
#[derive(Error, Debug)]
pub enum EvalError {
    /// Misconfigured prompt template or an instance missing a templated field
    #[error("Template error: {0}")]
    Template(String),

    /// Judge invocation failed; fatal for the run
    #[error("Judge backend failed on instance '{instance_id}': {source}")]
    Backend {
        instance_id: String,
        #[source]
        source: BackendError,
    },

    /// Judge text carried no recognizable label
    #[error("Unparsable verdict: {0}")]
    UnparsableVerdict(String),

    /// Malformed or empty result collection passed to aggregation
    #[error("Metrics computation failed: {0}")]
    Metrics(String),

    /// Invalid configuration (unknown task, bad option combination)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to load or validate input data
    #[error("Failed to load data: {0}")]
    Load(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single judge backend call
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("judge call timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Model(String),

    #[error("empty response from judge")]
    EmptyResponse,
}

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }
}

impl From<judgekit_core::CoreError> for BackendError {
    fn from(err: judgekit_core::CoreError) -> Self {
        match err {
            judgekit_core::CoreError::Timeout(after) => BackendError::Timeout(after),
            other => BackendError::Model(other.to_string()),
        }
    }
}

impl EvalError {
    pub(crate) fn backend(instance_id: &str, source: BackendError) -> Self {
        EvalError::Backend { instance_id: instance_id.to_string(), source }
    }
}
