//! Error types for Iris.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrisError {
    #[error("Vision provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IrisError {
    /// True for failures the recognition pipeline recovers from by falling
    /// back a tier instead of surfacing to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IrisError::ProviderUnavailable(_) | IrisError::MalformedResponse(_)
        )
    }
}
