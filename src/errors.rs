//! Error types for manualbuddy
//!
//! Library seams (vector store, LLM, router, config) return [`RagError`];
//! orchestration code layers `anyhow` context on top.

use thiserror::Error;

/// Main error type for the retrieval and routing layers
#[derive(Error, Debug)]
pub enum RagError {
    /// Query path asked for a collection that was never ingested
    #[error("Collection '{0}' does not exist - run `manualbuddy ingest` first")]
    CollectionNotFound(String),

    /// Vector store backend errors
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Embedding dimension mismatch between model and collection
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Hosted LLM API errors
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Tool selection failed or produced an unusable answer
    #[error("Tool selection failed: {0}")]
    Selection(String),

    /// Document parsing service errors
    #[error("Parser error: {0}")]
    Parser(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, RagError>;

impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(format!("{:#}", err))
    }
}
