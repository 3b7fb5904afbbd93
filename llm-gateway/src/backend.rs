//! Backend facade w/o async-trait or dynamic trait objects.
//!
//! We expose an enum `BackendClient` with concrete implementations per
//! provider. This keeps async fns simple and avoids boxing futures. The
//! model-to-backend mapping lives in the gateway as a plain lookup table;
//! no provider branching leaks into business logic.

use crate::chat::ChatMessage;
use crate::config::{BackendConfig, BackendProvider};
use crate::error_handler::GatewayError;
use crate::services::azure_openai_service::AzureOpenAiService;
use crate::services::openai_compat_service::OpenAiCompatService;

/// Concrete backend client (enum-dispatch).
#[derive(Debug, Clone)]
pub enum BackendClient {
    /// Azure OpenAI deployment.
    AzureOpenAi(AzureOpenAiService),
    /// OpenAI-compatible endpoint.
    OpenAiCompat(OpenAiCompatService),
}

impl BackendClient {
    /// Constructs a concrete client from generic config.
    pub fn from_config(cfg: BackendConfig) -> Result<Self, GatewayError> {
        Ok(match cfg.provider {
            BackendProvider::AzureOpenAi => Self::AzureOpenAi(AzureOpenAiService::new(cfg)?),
            BackendProvider::OpenAiCompat => Self::OpenAiCompat(OpenAiCompatService::new(cfg)?),
        })
    }

    /// Single non-streaming chat completion: system prompt + history + user turn.
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user: &str,
    ) -> Result<String, GatewayError> {
        match self {
            Self::AzureOpenAi(c) => c.complete(system_prompt, history, user).await,
            Self::OpenAiCompat(c) => c.complete(system_prompt, history, user).await,
        }
    }
}
