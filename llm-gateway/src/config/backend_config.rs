//! Per-backend configuration.

use crate::config::provider::BackendProvider;

/// Configuration for one LLM backend invocation target.
///
/// This struct contains both general and provider-specific parameters.
/// It can be extended as needed to support new backends or features.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// The backend provider (Azure OpenAI or OpenAI-compatible).
    pub provider: BackendProvider,

    /// Model identifier string sent on the wire
    /// (e.g., `"gpt-4"`, `"mixtral-8x7b-instruct"`).
    pub model: String,

    /// Azure deployment name. Required for [`BackendProvider::AzureOpenAi`],
    /// ignored by OpenAI-compatible endpoints.
    pub deployment: Option<String>,

    /// Base endpoint URL (e.g., `https://myresource.openai.azure.com`).
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: Option<String>,

    /// API version query parameter (Azure) or path version (compat).
    pub api_version: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic).
    pub temperature: Option<f32>,

    /// Optional request timeout (in seconds) for the HTTP client.
    pub timeout_secs: Option<u64>,
}
