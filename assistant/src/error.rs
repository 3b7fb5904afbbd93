//! Typed error for the assistant crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// Errors from the underlying llm-gateway crate.
    #[error("[Assistant] gateway error: {0}")]
    Gateway(#[from] llm_gateway::GatewayError),

    /// Errors from the underlying rag-retriever crate.
    #[error("[Assistant] retrieval error: {0}")]
    Retrieve(#[from] rag_retriever::RetrieveError),

    /// The contextualization call produced empty content.
    #[error("[Assistant] contextualizer returned empty content")]
    EmptyContextualization,

    /// The answering call produced empty content.
    #[error("[Assistant] question answerer returned empty content")]
    EmptyAnswer,
}
