//! Gateway configuration loaded strictly from environment variables.
//!
//! This module provides convenience constructors for [`BackendConfig`],
//! grouped by provider and logical model, plus the assembled
//! [`GatewayConfig`] consumed by the gateway:
//!
//! - **GPT-4**      → Azure OpenAI deployment (primary backend)
//! - **Open models** → OpenAI-compatible academic cloud endpoint
//! - **Embedding**  → Azure OpenAI embeddings deployment
//!
//! # Environment variables
//!
//! Azure OpenAI:
//! - `AZURE_OPENAI_URL`                 = resource endpoint (mandatory)
//! - `AZURE_OPENAI_API_KEY`             = API key (mandatory)
//! - `AZURE_OPENAI_GPT4_DEPLOYMENT`     = chat deployment name (mandatory)
//! - `AZURE_OPENAI_GPT4_MODEL`          = chat model id (mandatory)
//! - `AZURE_OPENAI_EMBEDDER_DEPLOYMENT` = embeddings deployment (mandatory)
//! - `AZURE_OPENAI_EMBEDDER_MODEL`      = embeddings model id (mandatory)
//!
//! Academic cloud (OpenAI-compatible):
//! - `GWDG_URL`     = API base (mandatory for the open models)
//! - `GWDG_API_KEY` = API key (mandatory for the open models)
//!
//! Failover knobs:
//! - `BACKEND_TIMEOUT_SECS` = per-call bound for non-primary backends (default 7)
//! - `CIRCUIT_RESET_SECS`   = breaker auto-close window (default 300)

use crate::config::{backend_config::BackendConfig, provider::BackendProvider};
use crate::error_handler::{Result, env_opt_u64, must_env, validate_http_endpoint};

/// Azure chat completions API version.
const AZURE_CHAT_API_VERSION: &str = "2023-05-15";
/// Azure embeddings API version.
const AZURE_EMBEDDINGS_API_VERSION: &str = "2023-07-01-preview";

/// Complete configuration bag for [`crate::gateway::LlmGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Primary backend (GPT-4 on Azure OpenAI).
    pub gpt4: BackendConfig,
    /// Mixtral 8x7B instruct.
    pub mistral8: BackendConfig,
    /// Llama 3 70B instruct.
    pub llama3: BackendConfig,
    /// Qwen2 72B instruct.
    pub qwen2: BackendConfig,
    /// Embeddings backend (Azure OpenAI).
    pub embedding: BackendConfig,
    /// Wall-clock bound for one non-primary backend call, in seconds.
    pub backend_timeout_secs: u64,
    /// Circuit breaker auto-close window, in seconds.
    pub circuit_reset_secs: u64,
}

impl GatewayConfig {
    /// Builds the full gateway configuration from the environment.
    ///
    /// # Errors
    /// Returns [`crate::error_handler::ConfigError`] variants when mandatory
    /// variables are missing or malformed.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            gpt4: config_azure_gpt4()?,
            mistral8: config_academic_cloud("mixtral-8x7b-instruct")?,
            llama3: config_academic_cloud("meta-llama-3-70b-instruct")?,
            qwen2: config_academic_cloud("qwen2-72b-instruct")?,
            embedding: config_azure_embedding()?,
            backend_timeout_secs: env_opt_u64("BACKEND_TIMEOUT_SECS")?.unwrap_or(7),
            circuit_reset_secs: env_opt_u64("CIRCUIT_RESET_SECS")?.unwrap_or(300),
        })
    }
}

/// Constructs the config for the **GPT-4** Azure OpenAI deployment.
///
/// # Defaults
/// - `temperature = Some(0.0)`
/// - `timeout_secs = Some(60)` (HTTP client bound; the failover timeout does
///   not apply to the primary backend)
pub fn config_azure_gpt4() -> Result<BackendConfig> {
    let endpoint = must_env("AZURE_OPENAI_URL")?;
    validate_http_endpoint("AZURE_OPENAI_URL", &endpoint)?;

    Ok(BackendConfig {
        provider: BackendProvider::AzureOpenAi,
        model: must_env("AZURE_OPENAI_GPT4_MODEL")?,
        deployment: Some(must_env("AZURE_OPENAI_GPT4_DEPLOYMENT")?),
        endpoint,
        api_key: Some(must_env("AZURE_OPENAI_API_KEY")?),
        api_version: Some(AZURE_CHAT_API_VERSION.to_string()),
        max_tokens: None,
        temperature: Some(0.0),
        timeout_secs: Some(60),
    })
}

/// Constructs the config for the **embedding** Azure OpenAI deployment.
///
/// # Defaults
/// - `temperature = None` (not applicable to embeddings)
/// - `timeout_secs = Some(30)`
pub fn config_azure_embedding() -> Result<BackendConfig> {
    let endpoint = must_env("AZURE_OPENAI_URL")?;
    validate_http_endpoint("AZURE_OPENAI_URL", &endpoint)?;

    Ok(BackendConfig {
        provider: BackendProvider::AzureOpenAi,
        model: must_env("AZURE_OPENAI_EMBEDDER_MODEL")?,
        deployment: Some(must_env("AZURE_OPENAI_EMBEDDER_DEPLOYMENT")?),
        endpoint,
        api_key: Some(must_env("AZURE_OPENAI_API_KEY")?),
        api_version: Some(AZURE_EMBEDDINGS_API_VERSION.to_string()),
        max_tokens: None,
        temperature: None,
        timeout_secs: Some(30),
    })
}

/// Constructs a config for one **open model** on the academic cloud.
///
/// All open models share the same endpoint and key and differ only in the
/// wire model id.
///
/// # Defaults
/// - `temperature = Some(0.0)`, `max_tokens = Some(400)` (hard token cap,
///   answers are shown in a small chat bubble)
/// - `timeout_secs = Some(30)` (HTTP client bound; the gateway applies the
///   tighter failover timeout on top)
pub fn config_academic_cloud(model: &str) -> Result<BackendConfig> {
    let endpoint = must_env("GWDG_URL")?;
    validate_http_endpoint("GWDG_URL", &endpoint)?;

    Ok(BackendConfig {
        provider: BackendProvider::OpenAiCompat,
        model: model.to_string(),
        deployment: None,
        endpoint,
        api_key: Some(must_env("GWDG_API_KEY")?),
        api_version: Some("v1".to_string()),
        max_tokens: Some(400),
        temperature: Some(0.0),
        timeout_secs: Some(30),
    })
}
