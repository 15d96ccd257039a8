use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The detector was asked to run without an embedding provider attached.
    #[error("Detector not initialized: {0}")]
    NotInitialized(String),

    #[error("Embedding provider failed: {0}")]
    Provider(String),

    #[error("Malformed candidate: {0}")]
    MalformedCandidate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Detection timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking detection worker was cancelled before finishing, e.g. on runtime shutdown.
    #[error("Detection cancelled: {0}")]
    Cancelled(String),

    #[error("Model load failed: {0}")]
    Model(String),
}

impl Error {
    /// True when the failure means "detector unavailable" rather than a bad request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::NotInitialized(_) | Error::Model(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
