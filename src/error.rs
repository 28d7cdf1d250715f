//! Error types for the multi-agent financial platform

use thiserror::Error;

/// Result type alias for platform operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Agent '{0}' not found")]
    AgentNotFound(String),

    #[error("Agent execution failed: {0}")]
    AgentError(String),

    #[error("Maximum concurrent agents reached")]
    ConcurrencyLimit,

    #[error("Unknown workflow type: {0}")]
    UnknownWorkflow(String),

    #[error("Data source error: {0}")]
    DataSourceError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
