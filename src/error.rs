//! Error types for the sira research assistant.

use sira_retrieval::RetrievalError;

/// Top-level error type for the research assistant.
#[derive(Debug, thiserror::Error)]
pub enum SiraError {
    /// Configuration could not be loaded, saved or validated.
    #[error("config error: {0}")]
    Config(String),

    /// The retrieval layer rejected its configuration or was cancelled.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// A downstream pipeline stage (summary, graph, embedding, vector store)
    /// failed.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SiraError>;
