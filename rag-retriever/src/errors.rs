//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for retrieval operations.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// Invalid or unsupported configuration.
    #[error("[Retriever] config error: {0}")]
    Config(String),

    /// Embedding failures surfaced from the gateway.
    #[error("[Retriever] embedding failed: {0}")]
    Gateway(#[from] llm_gateway::GatewayError),

    /// Qdrant client errors (wrapped).
    #[error("[Retriever] qdrant error: {0}")]
    Qdrant(String),

    /// Generic error from anyhow chain.
    #[error("[Retriever] internal: {0}")]
    Internal(#[from] anyhow::Error),
}
