//! Provider (backend) kinds used for LLM inference.

/// Represents the provider (backend) used for chat completion and embeddings.
///
/// Adding more providers in the future (e.g., a local runtime) is done by
/// extending this enum and adding a matching service client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendProvider {
    /// Azure OpenAI deployments (GPT-4 and the embedding model).
    AzureOpenAi,
    /// Any endpoint speaking the OpenAI `/v1/chat/completions` dialect,
    /// such as the academic cloud hosting the open models.
    OpenAiCompat,
}
