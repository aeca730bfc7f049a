//! Error types for the RAG service
//!
//! Provides typed errors with context propagation for configuration and
//! startup failures. Pipeline modules report through `anyhow` and bridge
//! into [`RagError`] at the boundary.

use thiserror::Error;

/// Main error type for the RAG knowledge-base service
#[derive(Error, Debug)]
pub enum RagError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("RAG error: {0}")]
    Generic(String),
}

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(err.to_string())
    }
}
