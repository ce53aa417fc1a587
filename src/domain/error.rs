//! Domain error types

use thiserror::Error;

/// Errors that can occur while building or running a demodulator
#[derive(Error, Debug)]
pub enum DemodError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl DemodError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors raised while constructing a pipeline
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for demodulator operations
pub type DemodResult<T> = Result<T, DemodError>;
