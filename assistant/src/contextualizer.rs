//! Query condensation: rewrite a follow-up message into a standalone
//! retrieval query using the chat history.

use std::sync::Arc;

use llm_gateway::{ChatMessage, LlmGateway, ModelId};
use tracing::debug;

use crate::error::AssistantError;
use crate::prompt::CONDENSE_QUESTION_PROMPT;

pub struct Contextualizer {
    gateway: Arc<LlmGateway>,
}

impl Contextualizer {
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Rewrites `query` into a self-contained retrieval query.
    ///
    /// With an empty history there is nothing to condense: the query is
    /// returned unchanged and no backend call is made. The result is used
    /// for retrieval only and never shown to the user.
    ///
    /// # Errors
    /// - [`AssistantError::Gateway`] on backend failures
    /// - [`AssistantError::EmptyContextualization`] on empty model output
    pub async fn contextualize(
        &self,
        query: &str,
        history: &[ChatMessage],
        model: ModelId,
    ) -> Result<String, AssistantError> {
        if history.is_empty() {
            debug!("empty history, passing query through unchanged");
            return Ok(query.to_string());
        }

        let response = self
            .gateway
            .chat(query, history, model, CONDENSE_QUESTION_PROMPT)
            .await?;

        let condensed = response.content.trim().to_string();
        if condensed.is_empty() {
            return Err(AssistantError::EmptyContextualization);
        }

        debug!(condensed_len = condensed.len(), "query contextualized");
        Ok(condensed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_gateway::{BackendConfig, BackendProvider, GatewayConfig};

    fn backend(provider: BackendProvider, model: &str) -> BackendConfig {
        BackendConfig {
            provider,
            model: model.into(),
            deployment: matches!(provider, BackendProvider::AzureOpenAi)
                .then(|| format!("{model}-deployment")),
            endpoint: "http://localhost:9".into(),
            api_key: Some("test-key".into()),
            api_version: Some("v1".into()),
            max_tokens: Some(400),
            temperature: Some(0.0),
            timeout_secs: Some(1),
        }
    }

    fn offline_gateway() -> Arc<LlmGateway> {
        // Port 9 is never contacted: the passthrough path makes no calls.
        Arc::new(
            LlmGateway::new(GatewayConfig {
                gpt4: backend(BackendProvider::AzureOpenAi, "gpt-4"),
                mistral8: backend(BackendProvider::OpenAiCompat, "mixtral-8x7b-instruct"),
                llama3: backend(BackendProvider::OpenAiCompat, "meta-llama-3-70b-instruct"),
                qwen2: backend(BackendProvider::OpenAiCompat, "qwen2-72b-instruct"),
                embedding: backend(BackendProvider::AzureOpenAi, "text-embedding"),
                backend_timeout_secs: 7,
                circuit_reset_secs: 300,
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn empty_history_passes_query_through_without_calls() {
        let contextualizer = Contextualizer::new(offline_gateway());
        let out = contextualizer
            .contextualize("Was ist KI-Campus?", &[], ModelId::Gpt4)
            .await
            .unwrap();
        assert_eq!(out, "Was ist KI-Campus?");
    }
}
