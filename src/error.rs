//
// μDCN MTU Engine Error Types
//

use thiserror::Error;

/// Errors raised inside the MTU prediction engine
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem failure (config, model artifact, history export)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid engine configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Model artifact missing, unreadable or malformed
    #[error("model artifact error: {0}")]
    ModelArtifact(String),

    /// A strategy could not produce a usable prediction
    #[error("prediction error: {0}")]
    Prediction(String),

    /// Metrics registration or encoding failure
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Caller supplied an argument that cannot be used
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
